//! `nbmirror`: mirror two trees with notebooks replaced by their diffable
//! sources, ready for an external directory diff.

use clap::Parser;
use nbtools_cli::cli_contract::{exit_for_parse_error, AppExit, MirrorCli};
use nbtools_cli::cli_failure::io_failure;
use nbtools_cli::init_tracing;
use nbtools_core::mirror::{create_mirror, remove_mirror};
use std::process::ExitCode;
use tracing::{info, warn};

fn main() -> ExitCode {
    let cli = match MirrorCli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return exit_for_parse_error(&err).code(),
    };
    init_tracing();

    // Either both mirrors are built or neither is left behind.
    let mut created = Vec::new();
    for root in [&cli.left, &cli.right] {
        match create_mirror(root) {
            Ok(summary) => {
                info!(
                    notebooks = summary.notebooks,
                    linked = summary.linked,
                    "mirrored {}",
                    root.display()
                );
                created.push((root, summary));
            }
            Err(err) => {
                for (done, _) in &created {
                    if let Err(cleanup) = remove_mirror(done) {
                        warn!(root = %done.display(), %cleanup, "failed to remove mirror");
                    }
                }
                let what = format!("cannot mirror {}", root.display());
                let (exit, message) = io_failure(&what, &err);
                eprintln!("{message}");
                return exit.code();
            }
        }
    }
    for (_, summary) in &created {
        println!("{}", summary.mirror_root.display());
    }
    AppExit::Success.code()
}
