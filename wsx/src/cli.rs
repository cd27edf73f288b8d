pub fn parse_flags<'a>() -> clap::ArgMatches<'a> {
    clap::App::new("wsx")
        .version(clap::crate_version!())
        .about("Explore and extract directories and files inside WildStar archive pairs")
        .arg(
            clap::Arg::from_usage(
                "-p, --path [archive] 'Base path of the .index/.archive pair'",
            )
            .global(true),
        )
        .arg(
            clap::Arg::from_usage("-d --debug 'Print raw entry and header metadata'")
                .global(true),
        )
        .arg(
            clap::Arg::from_usage("-r --recursive 'Recurse into subdirectories when listing'")
                .global(true),
        )
        .subcommand(
            clap::SubCommand::with_name("find")
                .about("List every entry whose path contains a pattern")
                .args_from_usage("<PATTERN> 'Substring to match against full paths'"),
        )
        .subcommand(
            clap::SubCommand::with_name("list")
                .about("List the children of a directory")
                .args_from_usage("[PATH] 'Directory to list (defaults to the root)'"),
        )
        .subcommand(
            clap::SubCommand::with_name("extract")
                .about("Extract a directory or file to a destination")
                .args_from_usage(
                    "[PATH] 'Entry to extract (defaults to the root)'
                     [DEST] 'Destination directory (defaults to the current one)'",
                ),
        )
        .subcommand(
            clap::SubCommand::with_name("diff")
                .about("Compare against another archive pair, per top-level directory")
                .args_from_usage(
                    "<OTHER> 'Base path of the other .index/.archive pair'
                     [PATH]  'Limit the comparison to a subtree'",
                ),
        )
        .get_matches()
}
