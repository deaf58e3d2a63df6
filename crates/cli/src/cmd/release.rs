//! Release command: discover, filter, build, copy and write the manifest.

use std::fs;

use publish_core::build::{BuildOptions, build};
use publish_core::config::types::ResolvedConfig;
use publish_core::filter::filter_artifacts;
use publish_core::manifest::write_manifest;
use publish_core::publish::publish;
use tracing::error;

use super::{discover_input, resolve_now};
use crate::ReleaseArgs;

pub fn run(rc: &ResolvedConfig, args: ReleaseArgs) {
    if args.output.exists() && !args.output.is_dir() {
        error!("output path {} is not a directory", args.output.display());
        std::process::exit(1);
    }
    if let Err(e) = fs::create_dir_all(&args.output) {
        error!("failed to create output directory {}: {e}", args.output.display());
        std::process::exit(1);
    }

    let now = resolve_now(args.discover.now.as_deref());

    println!("Discovered publications:");
    let mut discovered = discover_input(rc, &args.discover);
    for (collection_key, collection) in &discovered.collections {
        for (publication_key, publication) in &collection.publications {
            let count = publication.artifacts.len();
            println!("  {collection_key}/{publication_key} ({count} artifacts)");
        }
    }

    if let Some(ref wanted) = args.artifact_filter {
        println!();
        println!("Filtering artifacts by key '{wanted}':");
        discovered = filter_artifacts(discovered, |key, _| key == wanted.as_str(), true);
        println!("  {} artifacts kept", discovered.artifact_count());
    }

    println!();
    println!("Building:");
    let options = BuildOptions {
        ignore_release_time: args.ignore_release_time,
        verbose: args.verbose,
        now,
    };
    let built = match build(&discovered, &options) {
        Ok(built) => built,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    println!();
    println!("Copying:");
    let published = match publish(&built, &args.output) {
        Ok(published) => published,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };
    for artifact in published.artifacts() {
        println!("  <output>/{}", artifact.artifact.path);
    }

    match write_manifest(&published, &args.output) {
        Ok(path) => {
            println!();
            println!(
                "Published {} of {} artifacts; manifest written to {}",
                published.artifact_count(),
                discovered.artifact_count(),
                path.display()
            );
        }
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}
