use clap::*;
use cnp::libs::parsimony::labeling::ancestral_labeling;
use cnp::libs::parsimony::sankoff::small_rectilinear;
use cnp::libs::parsimony::{attach_profiles, LabeledTree};
use cnp::libs::phylo::Tree;
use cnp::libs::profile::{self, BreakpointProfile, CopyNumberProfile};
use std::collections::BTreeMap;
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("score")
        .about("Rectilinear parsimony score of a fixed tree")
        .after_help(
            r###"
Scores a rooted binary tree whose leaves match the `node` column of the
profile table. Copy-number profiles are breakpoint-encoded before scoring;
the reported score is the minimum total L1 breakpoint change over all
labelings of the internal vertices.

With --ancestral, one optimal labeling is fixed and written as a profile
table covering every vertex (unnamed internal vertices are numbered
internal_0, internal_1, ... in traversal order).

Examples:
1. Score only:
   cnp score tree.nwk profiles.csv

2. Score plus ancestral copy-number profiles and branch lengths:
   cnp score tree.nwk profiles.csv \
       --ancestral anc.csv --copy-number --branches branches.tsv

"###,
        )
        .arg(
            Arg::new("tree")
                .required(true)
                .num_args(1)
                .index(1)
                .help("Rooted binary tree in Newick format"),
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .num_args(1)
                .index(2)
                .help("Profile table. [stdin] for standard input"),
        )
        .arg(
            Arg::new("diploid")
                .long("diploid")
                .short('d')
                .num_args(1)
                .default_value("2")
                .value_parser(value_parser!(i32))
                .help("Baseline copy number at chromosome boundaries"),
        )
        .arg(
            Arg::new("ancestral")
                .long("ancestral")
                .num_args(1)
                .help("Write ancestral profiles to this file"),
        )
        .arg(
            Arg::new("copy-number")
                .long("copy-number")
                .action(ArgAction::SetTrue)
                .help("Write ancestral profiles as copy numbers instead of breakpoints"),
        )
        .arg(
            Arg::new("branches")
                .long("branches")
                .num_args(1)
                .help("Write per-vertex branch magnitudes to this file"),
        )
        .arg(
            Arg::new("outfile")
                .short('o')
                .long("outfile")
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        )
}

/// Breakpoint-encode every profile of a table.
pub fn breakpoints_from_table(
    table: &BTreeMap<String, (Vec<profile::GenomicBin>, Vec<i32>)>,
    diploid: i32,
) -> BTreeMap<String, BreakpointProfile> {
    table
        .iter()
        .map(|(node, (bins, values))| {
            let cn = CopyNumberProfile {
                bins: bins.clone(),
                profile: values.clone(),
            };
            (node.clone(), profile::to_breakpoint(&cn, diploid))
        })
        .collect()
}

fn write_ancestral(
    bt: &LabeledTree,
    outfile: &str,
    as_copy_number: bool,
    diploid: i32,
) -> anyhow::Result<()> {
    let mut writer = cnp::writer(outfile);
    profile::write_profile_header(&mut writer)?;
    for v in bt.node_indices() {
        let data = &bt[v];
        if as_copy_number {
            let cn = profile::to_copy_number(&data.profile, diploid);
            profile::write_profile_rows(&mut writer, &data.name, &cn.bins, &cn.profile)?;
        } else {
            profile::write_profile_rows(
                &mut writer,
                &data.name,
                &data.profile.bins,
                &data.profile.profile,
            )?;
        }
    }
    Ok(())
}

fn write_branches(bt: &LabeledTree, outfile: &str) -> anyhow::Result<()> {
    let mut writer = cnp::writer(outfile);
    for v in bt.node_indices() {
        let data = &bt[v];
        if let Some(length) = data.in_branch_length {
            writeln!(writer, "{}\t{}", data.name, length)?;
        }
    }
    Ok(())
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let mut writer = cnp::writer(args.get_one::<String>("outfile").unwrap());

    let diploid = *args.get_one::<i32>("diploid").unwrap();

    let tree = Tree::from_file(args.get_one::<String>("tree").unwrap())?;
    if !tree.is_binary() {
        anyhow::bail!("the input tree is not strictly binary");
    }

    let table = profile::read_profile_table(cnp::reader(args.get_one::<String>("infile").unwrap()))?;
    let profiles = breakpoints_from_table(&table, diploid);

    let (mut t, root, bins) = attach_profiles(&tree, &profiles)?;
    small_rectilinear(&mut t, root)?;

    writeln!(writer, "{}", t[root].score)?;

    let needs_labeling = args.contains_id("ancestral") || args.contains_id("branches");
    if needs_labeling {
        let (bt, _) = ancestral_labeling(&t, root, &bins)?;

        if let Some(outfile) = args.get_one::<String>("ancestral") {
            write_ancestral(&bt, outfile, args.get_flag("copy-number"), diploid)?;
        }
        if let Some(outfile) = args.get_one::<String>("branches") {
            write_branches(&bt, outfile)?;
        }
    }

    Ok(())
}
