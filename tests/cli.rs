// tests/cli.rs

use assetpipe::cli::{CliArgs, Command, env_selects_production};
use assetpipe::types::BuildMode;
use clap::Parser;

#[test]
fn serve_is_the_development_mode() {
    let args = CliArgs::try_parse_from(["assetpipe", "serve"]).unwrap();
    assert!(matches!(args.command, Command::Serve));
    assert_eq!(args.command.mode(), BuildMode::Serve);
    assert!(!args.production);
    assert!(args.config.is_none());
}

#[test]
fn build_accepts_serve_and_global_flags() {
    let args = CliArgs::try_parse_from([
        "assetpipe",
        "build",
        "--serve",
        "--production",
        "--config",
        "web/Assetpipe.toml",
    ])
    .unwrap();

    assert!(matches!(args.command, Command::Build { serve: true }));
    assert_eq!(args.command.mode(), BuildMode::Build);
    assert!(args.production);
    assert!(args.is_production());
    assert_eq!(args.config.as_deref(), Some("web/Assetpipe.toml"));
}

#[test]
fn plain_build_does_not_serve() {
    let args = CliArgs::try_parse_from(["assetpipe", "--dry-run", "build"]).unwrap();
    assert!(matches!(args.command, Command::Build { serve: false }));
    assert!(args.dry_run);
}

#[test]
fn a_subcommand_is_required() {
    assert!(CliArgs::try_parse_from(["assetpipe"]).is_err());
    assert!(CliArgs::try_parse_from(["assetpipe", "deploy"]).is_err());
}

#[test]
fn serve_rejects_the_build_only_flag() {
    assert!(CliArgs::try_parse_from(["assetpipe", "serve", "--serve"]).is_err());
}

#[test]
fn environment_selects_production() {
    assert!(env_selects_production(Some("production")));
    assert!(env_selects_production(Some(" PRODUCTION ")));
    assert!(env_selects_production(Some("prod")));
    assert!(!env_selects_production(Some("development")));
    assert!(!env_selects_production(Some("")));
    assert!(!env_selects_production(None));
}
