use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};

use super::parse::{parse_graph, parse_vectors};
use super::Dataset;

const GRAPH_FILE: &str = "graph.json";
const VECTORS_FILE: &str = "vectors.json";

/// Sorted names of the dataset directories under `root`.
pub fn list_datasets(root: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(root)
        .with_context(|| format!("failed to list datasets in {}", root.display()))?;

    let mut ids = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", root.display()))?;
        let is_dir = entry
            .file_type()
            .with_context(|| format!("failed to stat {}", entry.path().display()))?
            .is_dir();
        if !is_dir {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            ids.push(name.to_owned());
        }
    }
    ids.sort();
    Ok(ids)
}

/// Loads `<root>/<id>`. The directory itself must exist; either file may be
/// missing or broken, which leaves that half of the dataset empty.
pub fn load_dataset(root: &Path, id: &str) -> Result<Dataset> {
    let dir = root.join(id);
    if !dir.is_dir() {
        return Err(anyhow!("dataset directory {} does not exist", dir.display()));
    }

    let graph = read_optional(&dir.join(GRAPH_FILE), parse_graph);
    let vectors = read_optional(&dir.join(VECTORS_FILE), parse_vectors);

    let dataset = Dataset {
        id: id.to_owned(),
        graph,
        vectors,
    };
    log::info!(
        "loaded dataset {id}: {} nodes, {} edges, {} vectors",
        dataset.node_count(),
        dataset.edge_count(),
        dataset.vectors.as_ref().map_or(0, Vec::len)
    );
    Ok(dataset)
}

fn read_optional<T>(path: &Path, parse: impl FnOnce(&str) -> Result<T>) -> Option<T> {
    if !path.exists() {
        log::info!("{} not found; pane will be empty", path.display());
        return None;
    }

    let result = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))
        .and_then(|raw| parse(&raw).with_context(|| format!("failed to parse {}", path.display())));
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            log::warn!("{error:#}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn lists_only_directories_in_order() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("zeta")).unwrap();
        fs::create_dir(root.path().join("alpha")).unwrap();
        write(root.path(), "README.txt", "not a dataset");

        assert_eq!(list_datasets(root.path()).unwrap(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn listing_a_missing_root_fails() {
        let root = tempfile::tempdir().unwrap();
        assert!(list_datasets(&root.path().join("nope")).is_err());
    }

    #[test]
    fn loads_both_sub_resources() {
        let root = tempfile::tempdir().unwrap();
        write(
            root.path(),
            "karate/graph.json",
            r#"{"nodes": [{"node_idx": 0}, {"node_idx": 1}], "edges": [{"edge_idx": 0, "source": 0, "target": 1}]}"#,
        );
        write(
            root.path(),
            "karate/vectors.json",
            r#"[{"node_idx": 0, "values": [1, 4, 2]}]"#,
        );

        let dataset = load_dataset(root.path(), "karate").unwrap();
        assert_eq!(dataset.id, "karate");
        assert_eq!(dataset.node_count(), 2);
        assert_eq!(dataset.edge_count(), 1);
        assert_eq!(dataset.vectors.unwrap().len(), 1);
    }

    #[test]
    fn missing_or_broken_sub_resources_become_none() {
        let root = tempfile::tempdir().unwrap();
        write(root.path(), "partial/vectors.json", "{ broken");
        fs::create_dir_all(root.path().join("empty")).unwrap();

        let partial = load_dataset(root.path(), "partial").unwrap();
        assert!(partial.graph.is_none());
        assert!(partial.vectors.is_none());

        let empty = load_dataset(root.path(), "empty").unwrap();
        assert!(empty.graph.is_none());
        assert_eq!(empty.node_count(), 0);
    }

    #[test]
    fn missing_dataset_directory_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let error = load_dataset(root.path(), "ghost").unwrap_err();
        assert!(error.to_string().contains("ghost"));
    }
}
