use clap::*;
use cnp::libs::parsimony::nni::{hill_climb, stochastic_nni};
use cnp::libs::parsimony::sankoff::small_rectilinear;
use cnp::libs::parsimony::{attach_profiles, to_phylo_tree};
use cnp::libs::phylo::Tree;
use cnp::libs::profile;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("search")
        .about("Improve a tree topology by NNI hill climbing")
        .after_help(
            r###"
Starts from the given rooted binary tree and repeatedly applies the best
(or, with --greedy, the first) score-improving nearest-neighbor
interchange until none remains.

With --restarts N, the climb is followed by N rounds of stochastic
perturbation and re-climbing; each round perturbs the best tree so far
with floor(aggression * internal_edges) random NNI moves. The best tree
across all rounds is kept.

The final tree is written as Newick; the final score goes to stderr.
Fixing --seed makes the whole search reproducible.

Examples:
1. Plain hill climb:
   cnp search tree.nwk profiles.csv -o best.nwk

2. Perturbed restarts, reproducibly:
   cnp search tree.nwk profiles.csv --restarts 10 --seed 42

"###,
        )
        .arg(
            Arg::new("tree")
                .required(true)
                .num_args(1)
                .index(1)
                .help("Starting rooted binary tree in Newick format"),
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
            Arg::new("seed")
                .long("seed")
                .num_args(1)
                .default_value("0")
                .value_parser(value_parser!(u64))
                .help("Seed for the search RNG"),
        )
        .arg(
            Arg::new("greedy")
                .long("greedy")
                .action(ArgAction::SetTrue)
                .help("Take the first improving move instead of the best one"),
        )
        .arg(
            Arg::new("restarts")
                .long("restarts")
                .num_args(1)
                .default_value("0")
                .value_parser(value_parser!(usize))
                .help("Rounds of stochastic perturbation after the first climb"),
        )
        .arg(
            Arg::new("aggression")
                .long("aggression")
                .num_args(1)
                .default_value("0.5")
                .value_parser(value_parser!(f32))
                .help("Perturbation strength as a fraction of the internal edges"),
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

    let diploid = *args.get_one::<i32>("diploid").unwrap();
    let seed = *args.get_one::<u64>("seed").unwrap();
    let is_greedy = args.get_flag("greedy");
    let restarts = *args.get_one::<usize>("restarts").unwrap();
    let aggression = *args.get_one::<f32>("aggression").unwrap();

    let tree = Tree::from_file(args.get_one::<String>("tree").unwrap())?;
    if !tree.is_binary() {
        anyhow::bail!("the input tree is not strictly binary");
    }

    let table = profile::read_profile_table(cnp::reader(args.get_one::<String>("infile").unwrap()))?;
    let profiles = super::score::breakpoints_from_table(&table, diploid);

    let (mut t, root, _) = attach_profiles(&tree, &profiles)?;
    small_rectilinear(&mut t, root)?;

    let mut rng = StdRng::seed_from_u64(seed);

    let mut best = hill_climb(t, root, &mut rng, is_greedy)?;
    small_rectilinear(&mut best, root)?;
    let mut best_score = best[root].score;

    for round in 0..restarts {
        let mut perturbed = stochastic_nni(&best, &mut rng, aggression);
        small_rectilinear(&mut perturbed, root)?;

        let mut climbed = hill_climb(perturbed, root, &mut rng, is_greedy)?;
        small_rectilinear(&mut climbed, root)?;

        if climbed[root].score < best_score {
            eprintln!(
                "round {}: improved {} -> {}",
                round + 1,
                best_score,
                climbed[root].score
            );
            best_score = climbed[root].score;
            best = climbed;
        }
    }

    let out_string = to_phylo_tree(&best, root).to_newick();
    writer.write_all((out_string + "\n").as_ref())?;
    eprintln!("final score: {}", best_score);

    Ok(())
}
