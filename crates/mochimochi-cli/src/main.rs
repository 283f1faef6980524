use anyhow::Result;
use clap::{Arg, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use mochimochi_classifiers::config::MulticlassConfig;
use mochimochi_cli::drivers::binary::{resolve_model_config, run_binary, BinaryRun};
use mochimochi_cli::drivers::multiclass::{run_multiclass, MulticlassRun};

fn path_arg(id: &'static str, long: &'static str, help: &'static str) -> Arg {
    Arg::new(id)
        .long(long)
        .help(help)
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::FilePath)
}

/// Options shared by both train/test subcommands.
fn run_args(command: Command) -> Command {
    command
        .arg(path_arg("train", "train", "Path to the training examples (label idx:value ...)"))
        .arg(
            path_arg("test", "test", "Path to the test examples (label idx:value ...)")
                .required(true),
        )
        .arg(path_arg(
            "save",
            "save",
            "Write the model to this file after training",
        ))
        .arg(path_arg(
            "load",
            "load",
            "Start from a model file instead of a fresh model. \
             The stored hyper parameters and dimension replace the command line ones.",
        ))
        .arg(
            Arg::new("shuffle")
                .long("shuffle")
                .help("Shuffle the training examples with this seed before training")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            path_arg(
                "predictions",
                "predictions",
                "Write per-example predictions to this file (*.tsv or *.csv)",
            )
            .short('o'),
        )
}

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("MOCHIMOCHI_LOG", "error,mochimochi=info"))
        .init();

    let matches = Command::new("mochimochi")
        .version(clap::crate_version!())
        .about("Online margin-based linear classifiers: train on a stream, report test accuracy")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(run_args(
            Command::new("binary")
                .about("Train and test a binary (-1/+1) classifier")
                .arg(
                    Arg::new("model")
                        .help(
                            "Algorithm name (pa, pa1, pa2, arow, nherd, scw, adagrad-rda, adam) \
                             or path to a JSON model configuration",
                        )
                        .required_unless_present("load")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("dim")
                        .long("dim")
                        .help("Feature dimension. Overrides the dimension of a JSON configuration.")
                        .value_parser(clap::value_parser!(usize)),
                ),
        ))
        .subcommand(run_args(
            Command::new("multi")
                .about("Train and test the multiclass Passive-Aggressive classifier")
                .arg(
                    Arg::new("dim")
                        .long("dim")
                        .help("Feature dimension")
                        .required_unless_present("load")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("class")
                        .long("class")
                        .help("Number of classes; labels are 0..class-1")
                        .required_unless_present("load")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("c")
                        .long("c")
                        .help("Aggressiveness parameter C")
                        .default_value("0.5")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    Arg::new("select")
                        .long("select")
                        .help("Update rule: 0 PA, 1 PA-I, 2 PA-II")
                        .default_value("2")
                        .value_parser(clap::value_parser!(i32)),
                ),
        ))
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    let result = match matches.subcommand() {
        Some(("binary", sub_m)) => handle_binary(sub_m),
        Some(("multi", sub_m)) => handle_multi(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    };

    if let Err(e) = result {
        log::error!("Run failed: {:#}", e);
        std::process::exit(1)
    }
    Ok(())
}

fn run_paths(matches: &ArgMatches) -> (Option<PathBuf>, Option<PathBuf>, Option<PathBuf>, Option<PathBuf>) {
    (
        matches.get_one::<PathBuf>("load").cloned(),
        matches.get_one::<PathBuf>("train").cloned(),
        matches.get_one::<PathBuf>("save").cloned(),
        matches.get_one::<PathBuf>("predictions").cloned(),
    )
}

fn handle_binary(matches: &ArgMatches) -> Result<()> {
    let (load, train, save, predictions) = run_paths(matches);
    let dim = matches.get_one::<usize>("dim").copied();

    let model = match matches.get_one::<String>("model") {
        Some(name) if load.is_none() => Some(resolve_model_config(name, dim)?),
        Some(name) => {
            log::warn!("Ignoring model '{}': hyper parameters come from --load", name);
            None
        }
        None => None,
    };
    if let Some(config) = &model {
        log::info!(
            "[mochimochi::binary] {}",
            serde_json::to_string(config).unwrap_or_default()
        );
    }

    let run = BinaryRun {
        model,
        load,
        train,
        test: matches
            .get_one::<PathBuf>("test")
            .cloned()
            .unwrap_or_default(),
        save,
        shuffle: matches.get_one::<u64>("shuffle").copied(),
        predictions,
    };
    let evaluation = run_binary(&run)?;
    println!("{}", evaluation);
    Ok(())
}

fn handle_multi(matches: &ArgMatches) -> Result<()> {
    let (load, train, save, predictions) = run_paths(matches);
    let defaults = MulticlassConfig::default();
    let config = MulticlassConfig {
        dim: matches.get_one::<usize>("dim").copied().unwrap_or(defaults.dim),
        n_class: matches
            .get_one::<usize>("class")
            .copied()
            .unwrap_or(defaults.n_class),
        c: matches.get_one::<f64>("c").copied().unwrap_or(defaults.c),
        select: matches
            .get_one::<i32>("select")
            .copied()
            .unwrap_or(defaults.select),
    };
    if load.is_none() {
        log::info!(
            "[mochimochi::multi] {}",
            serde_json::to_string(&config).unwrap_or_default()
        );
    }

    let run = MulticlassRun {
        config,
        load,
        train,
        test: matches
            .get_one::<PathBuf>("test")
            .cloned()
            .unwrap_or_default(),
        save,
        shuffle: matches.get_one::<u64>("shuffle").copied(),
        predictions,
    };
    let evaluation = run_multiclass(&run)?;
    println!("{}", evaluation);
    Ok(())
}
