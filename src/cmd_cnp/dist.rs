use clap::*;
use cnp::libs::profile::{self, BreakpointProfile, CopyNumberProfile};
use itertools::Itertools;
use rayon::prelude::*;
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("dist")
        .about("Pairwise breakpoint distances between copy-number profiles")
        .after_help(
            r###"
The distance between two profiles is the L1 magnitude of the difference of
their breakpoint encodings. Output is a relaxed PHYLIP matrix: a count
line, then one row per node.

All profiles must cover the same bins.

Examples:
1. Distance matrix:
   cnp dist profiles.csv -o dist.phy

2. The input may already be breakpoint-encoded:
   cnp dist breakpoints.csv --bp

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .num_args(1)
                .index(1)
                .help("Input filename. [stdin] for standard input"),
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
            Arg::new("bp")
                .long("bp")
                .action(ArgAction::SetTrue)
                .help("Input is already a breakpoint table"),
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

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let mut writer = cnp::writer(args.get_one::<String>("outfile").unwrap());

    let infile = args.get_one::<String>("infile").unwrap();
    let diploid = *args.get_one::<i32>("diploid").unwrap();
    let is_bp = args.get_flag("bp");

    let table = profile::read_profile_table(cnp::reader(infile))?;

    let mut names = Vec::new();
    let mut breakpoints: Vec<BreakpointProfile> = Vec::new();
    for (node, (bins, values)) in &table {
        names.push(node.clone());
        if is_bp {
            // sort through a conversion round so rows align across nodes
            let bp = BreakpointProfile {
                bins: bins.clone(),
                profile: values.clone(),
            };
            breakpoints.push(profile::to_breakpoint(&profile::to_copy_number(&bp, diploid), diploid));
        } else {
            let cn = CopyNumberProfile {
                bins: bins.clone(),
                profile: values.clone(),
            };
            breakpoints.push(profile::to_breakpoint(&cn, diploid));
        }
    }

    if let Some(first) = breakpoints.first() {
        for bp in &breakpoints[1..] {
            if bp.bins != first.bins {
                anyhow::bail!("profiles do not share one bin sequence");
            }
        }
    }

    let rows: Vec<Vec<i64>> = breakpoints
        .par_iter()
        .map(|a| breakpoints.iter().map(|b| a.distance(b)).collect())
        .collect();

    writeln!(writer, "{}", names.len())?;
    for (name, row) in names.iter().zip(rows.iter()) {
        writeln!(writer, "{} {}", name, row.iter().join(" "))?;
    }

    Ok(())
}
