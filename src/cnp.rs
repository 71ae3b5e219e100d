extern crate clap;
use clap::*;

mod cmd_cnp;

fn main() -> anyhow::Result<()> {
    let app = Command::new("cnp")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`cnp` - Copy Number Phylogenetics")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .subcommand(cmd_cnp::convert::make_subcommand())
        .subcommand(cmd_cnp::dist::make_subcommand())
        .subcommand(cmd_cnp::score::make_subcommand())
        .subcommand(cmd_cnp::search::make_subcommand())
        .after_help(
            r###"Subcommand groups:

* Profiles:
    * convert - copy-number table <-> breakpoint table
    * dist    - pairwise breakpoint distance matrix

* Trees:
    * score   - rectilinear parsimony score and ancestral profiles
    * search  - NNI hill climb with stochastic restarts

Profile tables are CSV with the header:
    node,chromosome,allele,start,end,value

"###,
        );

    // Check which subcomamnd the user ran...
    match app.get_matches().subcommand() {
        Some(("convert", sub_matches)) => cmd_cnp::convert::execute(sub_matches),
        Some(("dist", sub_matches)) => cmd_cnp::dist::execute(sub_matches),
        Some(("score", sub_matches)) => cmd_cnp::score::execute(sub_matches),
        Some(("search", sub_matches)) => cmd_cnp::search::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}
