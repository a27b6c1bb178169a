use std::process::ExitCode;

use clap::{ArgAction, Args, Parser, Subcommand};
use log::error;

use crate::command::{CommandKind, KubeCommand};
use crate::kubernetes::KubeCluster;

mod command;
mod error;
mod kubernetes;
mod labels;
mod output;

/// Targets Kubernetes deployments by their labels or names and reads or
/// changes their scale.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show more detailed logs (repeat to show more)
    #[arg(short, action = ArgAction::Count, global = true)]
    verbosity: u8,

    /// The kubeconfig context to use instead of the current one.
    #[arg(short, long, global = true)]
    context: Option<String>,
}

#[derive(Debug, Args)]
struct Positionals {
    /// Labels (key=value) or deployment names, then the scale for the
    /// setters, then the namespace.
    #[arg(required = true, num_args = 1.., value_name = "ARGS")]
    args: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Counts the deployments carrying all of the given labels.
    #[command(name = "getNumWithLabels", alias = "getNumWithLabel")]
    GetNumWithLabels(Positionals),

    /// Prints the name of the one deployment carrying the given labels.
    #[command(name = "getName")]
    GetName(Positionals),

    /// Prints the names of every deployment carrying the given labels.
    #[command(name = "getNames")]
    GetNames(Positionals),

    /// Prints the replica count of one deployment.
    #[command(name = "getScale")]
    GetScale(Positionals),

    /// Prints the replica count of every targeted deployment.
    #[command(name = "getScales")]
    GetScales(Positionals),

    /// Sets the replica count of one deployment.
    #[command(name = "setScale")]
    SetScale(Positionals),

    /// Sets the replica count of every targeted deployment.
    #[command(name = "setScales")]
    SetScales(Positionals),

    /// Scales every targeted deployment to one replica.
    #[command(name = "toggleOn")]
    ToggleOn(Positionals),

    /// Scales every targeted deployment to zero replicas.
    #[command(name = "toggleOff")]
    ToggleOff(Positionals),

    /// Scales every targeted deployment down to zero and back up to one.
    #[command(name = "reset")]
    Reset(Positionals),

    /// Prints when each pod of one deployment was created.
    #[command(name = "getPodTimestamps", alias = "getPodCreationTimestamps")]
    GetPodTimestamps(Positionals),

    /// Prints how long each pod of one deployment has been alive.
    #[command(name = "getPodLifetimes")]
    GetPodLifetimes(Positionals),

    /// Prints the logs of each pod of one deployment.
    #[command(name = "getPodLogs")]
    GetPodLogs(Positionals),
}

impl Commands {
    fn into_parts(self) -> (CommandKind, Vec<String>) {
        match self {
            Commands::GetNumWithLabels(p) => (CommandKind::GetNumWithLabels, p.args),
            Commands::GetName(p) => (CommandKind::GetName, p.args),
            Commands::GetNames(p) => (CommandKind::GetNames, p.args),
            Commands::GetScale(p) => (CommandKind::GetScale, p.args),
            Commands::GetScales(p) => (CommandKind::GetScales, p.args),
            Commands::SetScale(p) => (CommandKind::SetScale, p.args),
            Commands::SetScales(p) => (CommandKind::SetScales, p.args),
            Commands::ToggleOn(p) => (CommandKind::ToggleOn, p.args),
            Commands::ToggleOff(p) => (CommandKind::ToggleOff, p.args),
            Commands::Reset(p) => (CommandKind::Reset, p.args),
            Commands::GetPodTimestamps(p) => (CommandKind::GetPodTimestamps, p.args),
            Commands::GetPodLifetimes(p) => (CommandKind::GetPodLifetimes, p.args),
            Commands::GetPodLogs(p) => (CommandKind::GetPodLogs, p.args),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    configure_logger(cli.verbosity);

    let (kind, args) = cli.command.into_parts();
    let result = KubeCommand::parse(kind, &args).and_then(|command| handle(command, cli.context));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn handle(command: KubeCommand, context: Option<String>) -> error::Result<()> {
    let cluster = KubeCluster::connect(context).await?;
    let output = command::execute(&command, &cluster).await?;
    output.write_to(&mut std::io::stdout().lock())?;
    Ok(())
}

fn configure_logger(verbosity: u8) {
    let mut clog = colog::default_builder();
    let log_level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    clog.filter(None, log_level);
    clog.init();
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_camel_case_commands_and_globals() {
        let cli = Cli::try_parse_from(["kubetoggler", "-vv", "setScale", "d1", "5", "ns"]).unwrap();
        assert_eq!(cli.verbosity, 2);
        let (kind, args) = cli.command.into_parts();
        assert_eq!(kind, CommandKind::SetScale);
        assert_eq!(args, vec!["d1", "5", "ns"]);
    }

    #[test]
    fn accepts_legacy_aliases() {
        let cli =
            Cli::try_parse_from(["kubetoggler", "getNumWithLabel", "a=1", "ns", "--context", "dev"])
                .unwrap();
        assert_eq!(cli.context.as_deref(), Some("dev"));
        assert_eq!(cli.command.into_parts().0, CommandKind::GetNumWithLabels);
    }

    #[test]
    fn requires_arguments() {
        assert!(Cli::try_parse_from(["kubetoggler", "getScale"]).is_err());
        assert!(Cli::try_parse_from(["kubetoggler", "scale", "d1", "ns"]).is_err());
    }
}
