//! Subcommand execution
//!
//! `link`, `replace` and `unlink` hold the snapshot's writer lock from load to
//! persist, so one writer runs at a time. `show` and `resolve` only read.

use crate::catalog;
use crate::cli::DEFAULT_STORE;
use crate::lock::WriterLock;
use anyhow::Context;
use clap::ArgMatches;
use reslink_core::{
    EntityRef, Link, LinkData, LinkGraph, LinkGraphConfig, LinkStore, TypeRegistry, TypeResolver,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

fn required<'a, T>(args: &'a ArgMatches, id: &str) -> anyhow::Result<&'a T>
where
    T: Clone + Send + Sync + 'static,
{
    args.get_one::<T>(id)
        .with_context(|| format!("missing --{id}"))
}

fn data(args: &ArgMatches) -> LinkData {
    args.get_one::<LinkData>("data").cloned().unwrap_or_default()
}

/// Configuration from `--config`, with `--store` taking precedence for the snapshot path
pub(crate) fn config(matches: &ArgMatches) -> anyhow::Result<LinkGraphConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => LinkGraphConfig::from_file(path)?,
        None => LinkGraphConfig::default(),
    };
    if let Some(store) = matches.get_one::<PathBuf>("store") {
        config.snapshot_path = Some(store.clone());
    } else if config.snapshot_path.is_none() {
        config.snapshot_path = Some(PathBuf::from(DEFAULT_STORE));
    }
    Ok(config)
}

fn lock_for_write(config: &LinkGraphConfig) -> anyhow::Result<WriterLock> {
    let snapshot = config
        .snapshot_path
        .as_deref()
        .context("no snapshot path configured")?;
    WriterLock::acquire(snapshot)
}

fn open(config: LinkGraphConfig, resolver: Arc<dyn TypeResolver>) -> anyhow::Result<LinkGraph> {
    LinkGraph::open(config, resolver).context("cannot open link store")
}

fn print_link(out: &mut impl Write, link: &Link) -> anyhow::Result<()> {
    writeln!(
        out,
        "{} -[{}]-> {}  {}  {}",
        link.from(),
        link.name(),
        link.to(),
        link.id(),
        serde_json::to_string(link.data())?
    )?;
    Ok(())
}

/// Run the selected subcommand, writing its report to `out`
pub(crate) fn run(matches: &ArgMatches, out: &mut impl Write) -> anyhow::Result<()> {
    let config = config(matches)?;

    match matches.subcommand() {
        Some(("link", args)) => {
            let _lock = lock_for_write(&config)?;
            let graph = open(config, Arc::new(TypeRegistry::new()))?;
            let from = required::<EntityRef>(args, "from")?;
            let to = required::<EntityRef>(args, "to")?;
            let name = required::<String>(args, "name")?;

            let id = graph.link(from, to, name, data(args))?;
            graph.persist()?;
            writeln!(out, "{id}")?;
        }
        Some(("replace", args)) => {
            let _lock = lock_for_write(&config)?;
            let graph = open(config, Arc::new(TypeRegistry::new()))?;
            let from = required::<EntityRef>(args, "from")?;
            let name = required::<String>(args, "name")?;
            let targets: Vec<EntityRef> = args
                .get_many::<EntityRef>("to")
                .map(|refs| refs.cloned().collect())
                .unwrap_or_default();

            let replaced = graph.replace(from, targets, name, &data(args))?;
            graph.persist()?;
            writeln!(
                out,
                "removed {}, inserted {}",
                replaced.removed,
                replaced.inserted.len()
            )?;
        }
        Some(("unlink", args)) => {
            let _lock = lock_for_write(&config)?;
            let graph = open(config, Arc::new(TypeRegistry::new()))?;
            let from = required::<EntityRef>(args, "from")?;
            let name = required::<String>(args, "name")?;

            let removed = graph.unlink_all(from, name)?;
            graph.persist()?;
            writeln!(out, "removed {removed}")?;
        }
        Some(("show", args)) => {
            let graph = open(config, Arc::new(TypeRegistry::new()))?;
            let entity = required::<EntityRef>(args, "entity")?;
            let name = args.get_one::<String>("name");
            let direction = args
                .get_one::<String>("direction")
                .map_or("both", String::as_str);
            let store = graph.store();

            let mut links = Vec::new();
            if direction != "in" {
                links.extend(match name {
                    Some(name) => store.find_by_from_and_name(entity, name)?,
                    None => store.links_from(entity)?,
                });
            }
            if direction != "out" {
                links.extend(match name {
                    Some(name) => store.find_by_to_and_name(entity, name)?,
                    None => store.links_to(entity)?,
                });
            }
            links.sort_by_key(Link::id);
            links.dedup_by_key(|link| link.id());

            for link in &links {
                print_link(out, link)?;
            }
        }
        Some(("resolve", args)) => {
            let registry = catalog::load(required::<PathBuf>(args, "catalog")?)?;
            let graph = open(config, Arc::new(registry))?;
            let entity = required::<EntityRef>(args, "entity")?;
            let name = required::<String>(args, "name")?;
            let kind = required::<String>(args, "kind")?;

            for record in graph.linked_resources(entity, name, kind)? {
                writeln!(out, "{}", serde_json::to_string(&record.attributes)?)?;
            }
        }
        Some((other, _)) => anyhow::bail!("unknown command `{other}`"),
        None => anyhow::bail!("no command given"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::command;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn exec(store: &Path, args: &[&str]) -> String {
        let mut argv = vec!["reslink", "--store", store.to_str().unwrap()];
        argv.extend_from_slice(args);
        let matches = command().try_get_matches_from(argv).unwrap();
        let mut out = Vec::new();
        run(&matches, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn replace_then_show_both_directions() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("links.json");

        let report = exec(
            &store,
            &[
                "replace", "--from", "process:1", "--name", "related_to", "--to", "process:2",
                "--to", "process:3",
            ],
        );
        assert_eq!(report, "removed 0, inserted 2\n");

        let outbound = exec(&store, &["show", "--entity", "process:1", "--direction", "out"]);
        assert_eq!(outbound.lines().count(), 2);

        let inbound = exec(&store, &["show", "--entity", "process:3", "--name", "related_to"]);
        assert_eq!(inbound.lines().count(), 1);
        assert!(inbound.starts_with("process:1 -[related_to]-> process:3"));
    }

    #[test]
    fn link_unlink_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("links.json");

        exec(
            &store,
            &[
                "link", "--from", "process:1", "--to", "meeting:4", "--name", "hosts", "--data",
                r#"{"by":"cli"}"#,
            ],
        );
        let shown = exec(&store, &["show", "--entity", "meeting:4"]);
        assert!(shown.contains(r#"{"by":"cli"}"#));

        assert_eq!(
            exec(&store, &["unlink", "--from", "process:1", "--name", "hosts"]),
            "removed 1\n"
        );
        assert_eq!(
            exec(&store, &["unlink", "--from", "process:1", "--name", "hosts"]),
            "removed 0\n"
        );
    }

    #[test]
    fn resolve_reads_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("links.json");
        let catalog = dir.path().join("catalog.json");
        std::fs::write(
            &catalog,
            r#"{"process": [{"id": 1}, {"id": 2, "title": "Parks"}]}"#,
        )
        .unwrap();

        exec(
            &store,
            &["replace", "--from", "process:1", "--name", "related_to", "--to", "process:2", "--to", "process:9"],
        );
        let resolved = exec(
            &store,
            &[
                "resolve",
                "--entity",
                "process:2",
                "--name",
                "related_to",
                "--kind",
                "process",
                "--catalog",
                catalog.to_str().unwrap(),
            ],
        );
        assert_eq!(resolved, "{\"id\":1}\n");

        let from_source = exec(
            &store,
            &[
                "resolve",
                "--entity",
                "process:1",
                "--name",
                "related_to",
                "--kind",
                "process",
                "--catalog",
                catalog.to_str().unwrap(),
            ],
        );
        assert_eq!(from_source, "{\"id\":2,\"title\":\"Parks\"}\n");
    }

    #[test]
    fn writer_lock_blocks_concurrent_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("links.json");
        exec(&store, &["link", "--from", "process:1", "--to", "process:2", "--name", "related_to"]);

        let held = WriterLock::acquire(&store).unwrap();
        let matches = command()
            .try_get_matches_from([
                "reslink",
                "--store",
                store.to_str().unwrap(),
                "replace",
                "--from",
                "process:1",
                "--name",
                "related_to",
            ])
            .unwrap();
        let err = run(&matches, &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("another reslink process"));

        // Readers are not blocked, and the refused write changed nothing.
        let shown = exec(&store, &["show", "--entity", "process:1"]);
        assert_eq!(shown.lines().count(), 1);

        drop(held);
        assert_eq!(
            exec(&store, &["replace", "--from", "process:1", "--name", "related_to"]),
            "removed 1, inserted 0\n"
        );
        assert!(!WriterLock::path_for(&store).exists());
    }

    #[test]
    fn config_store_flag_wins() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("reslink.toml");
        std::fs::write(&config_path, "snapshot_path = \"configured.json\"\nunique_targets = true\n")
            .unwrap();

        let matches = command()
            .try_get_matches_from([
                "reslink",
                "--config",
                config_path.to_str().unwrap(),
                "--store",
                "explicit.json",
                "unlink",
                "--from",
                "process:1",
                "--name",
                "x",
            ])
            .unwrap();
        let config = config(&matches).unwrap();

        assert_eq!(config.snapshot_path, Some(PathBuf::from("explicit.json")));
        assert!(config.unique_targets);
    }
}
