fn main() -> Result<(), wsx::error::Error> {
    let matches = wsx::cli::parse_flags();

    wsx::utils::initialize_debug_from_args(&matches);

    let base = matches.value_of("path").ok_or_else(|| {
        wsx::error::Error::CliInputError("An archive path is required (-p/--path).".to_string())
    })?;

    match matches.subcommand() {
        ("find", Some(cmd)) => {
            wsx::handler::find(base, cmd.value_of("PATTERN").unwrap())?;
        }
        ("list", Some(cmd)) => {
            wsx::handler::list(
                base,
                cmd.value_of("PATH").unwrap_or(""),
                cmd.is_present("recursive"),
            )?;
        }
        ("extract", Some(cmd)) => {
            wsx::handler::extract(
                base,
                cmd.value_of("PATH").unwrap_or(""),
                cmd.value_of("DEST").unwrap_or("."),
            )?;
        }
        ("diff", Some(cmd)) => {
            wsx::handler::diff(
                base,
                cmd.value_of("OTHER").unwrap(),
                cmd.value_of("PATH").unwrap_or(""),
            )?;
        }
        _ => {
            println!("No command specified or unknown command. Use --help for available commands.");
        }
    }
    Ok(())
}
