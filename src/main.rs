//! A wrapper around the `java_class_reader` library which loads a class file then prints an
//! approximate source listing of it.

use std::{fs, path::PathBuf};

use anyhow::Context;

use clap::{crate_authors, crate_version, Arg, ArgAction, Command};

use java_class_reader::{render, JavaClass};

fn cli() -> Command {
    let in_arg = Arg::new("input")
        .short('i')
        .long("input")
        .value_name("FILE")
        .help("Sets the class file to read")
        .action(ArgAction::Set)
        .value_parser(clap::value_parser!(PathBuf))
        .required(true);
    let debug_arg = Arg::new("debug")
        .short('d')
        .long("debug")
        .help("Dumps the decoded class instead of rendering it")
        .action(ArgAction::SetTrue);
    let verbose_arg = Arg::new("verbose")
        .short('v')
        .long("verbose")
        .help("Logs each decoding stage to stderr")
        .action(ArgAction::SetTrue);
    Command::new("Java Class Reader")
        .version(crate_version!())
        .author(crate_authors!())
        .about("Reads a Java class file, resolves it, then prints the class and its bytecode.")
        .arg(in_arg)
        .arg(debug_arg)
        .arg(verbose_arg)
}

struct Config {
    input: PathBuf,
    debug: bool,
    verbose: bool,
}

fn parse_args() -> anyhow::Result<Config> {
    let matches = cli().get_matches();
    let input = matches
        .get_one::<PathBuf>("input")
        .context("Missing input file")?
        .clone();
    Ok(Config {
        input,
        debug: matches.get_flag("debug"),
        verbose: matches.get_flag("verbose"),
    })
}

fn init_logging(config: &Config) {
    let level = if config.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .init();
}

fn main() -> anyhow::Result<()> {
    let config = parse_args()?;
    init_logging(&config);

    let bytes = fs::read(&config.input)
        .with_context(|| format!("Failed to read {}", config.input.display()))?;
    let class = JavaClass::read(&bytes)
        .with_context(|| format!("Failed to decode {}", config.input.display()))?;

    if config.debug {
        println!("{:#?}", class);
    } else {
        let lines = render::render_class(&class)
            .with_context(|| format!("Failed to render {}", config.input.display()))?;
        println!();
        println!("{}", lines.join("\n"));
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn verify_cli() {
        cli().debug_assert();
    }

    #[test]
    fn parses_flags() {
        let matches = cli()
            .try_get_matches_from(["java_class_reader", "-i", "Hello.class", "-d"])
            .unwrap();
        assert_eq!(
            Some(&PathBuf::from("Hello.class")),
            matches.get_one::<PathBuf>("input")
        );
        assert!(matches.get_flag("debug"));
        assert!(!matches.get_flag("verbose"));
    }

    #[test]
    fn input_is_required() {
        assert!(cli().try_get_matches_from(["java_class_reader"]).is_err());
    }
}
