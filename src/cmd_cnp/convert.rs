use clap::*;
use cnp::libs::profile::{self, BreakpointProfile, CopyNumberProfile};

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("convert")
        .about("Convert between copy-number and breakpoint profile tables")
        .after_help(
            r###"
Converts every profile in the table. Bins are grouped by (chromosome,
allele), sorted within each group, and groups are emitted in order, so the
output is canonically sorted even when the input is not.

Within each group the breakpoint encoding is the first difference of the
copy numbers, except at the boundaries: the first bin is measured against
the diploid baseline and the last bin encodes the return to it.

Examples:
1. Copy-number table to breakpoint table:
   cnp convert profiles.csv -o breakpoints.csv

2. Back again:
   cnp convert breakpoints.csv --invert -o profiles.csv

3. Haploid baseline:
   cnp convert profiles.csv --diploid 1

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
            Arg::new("invert")
                .long("invert")
                .action(ArgAction::SetTrue)
                .help("Input is a breakpoint table; reconstruct copy numbers"),
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
    let is_invert = args.get_flag("invert");

    let table = profile::read_profile_table(cnp::reader(infile))?;

    profile::write_profile_header(&mut writer)?;
    for (node, (bins, values)) in &table {
        if is_invert {
            let bp = BreakpointProfile {
                bins: bins.clone(),
                profile: values.clone(),
            };
            let cn = profile::to_copy_number(&bp, diploid);
            profile::write_profile_rows(&mut writer, node, &cn.bins, &cn.profile)?;
        } else {
            let cn = CopyNumberProfile {
                bins: bins.clone(),
                profile: values.clone(),
            };
            let bp = profile::to_breakpoint(&cn, diploid);
            profile::write_profile_rows(&mut writer, node, &bp.bins, &bp.profile)?;
        }
    }

    Ok(())
}
