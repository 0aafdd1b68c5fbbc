// ABOUTME: Namespace dependency resolver (C6) — extract requires, topo-sort files, report cycles

use crate::config::ResolverConfig;
use crate::error::{Cycle, DependencyError};
use crate::reader;
use crate::value::Value;
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A `:require` clause: a bare namespace symbol, or `[ns :as alias :refer [names]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequireClause {
    pub namespace: String,
    pub alias: Option<String>,
    pub refer: Vec<String>,
}

/// What was extracted from a file's leading `(ns ...)` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceInfo {
    pub name: String,
    pub requires: Vec<RequireClause>,
}

/// A file whose first top-level form was not `(ns ...)`, or had no forms at all.
/// Such files simply have no namespace-graph node; they aren't an error.
pub fn extract_ns_info(source: &str) -> Option<NamespaceInfo> {
    let (form, _) = reader::read_one(source).ok()?;
    let Value::List(l) = &form else { return None };
    let items: Vec<Value> = l.iter().collect();
    let head = items.first()?.as_symbol()?;
    if head.is_qualified() || head.name.as_ref() != "ns" {
        return None;
    }
    let name = items.get(1)?.as_symbol()?.to_string();

    let mut requires = Vec::new();
    for clause in &items[2..] {
        let Value::List(form_list) = clause else { continue };
        let form_items: Vec<Value> = form_list.iter().collect();
        let Some(keyword) = form_items.first().and_then(Value::as_keyword) else {
            continue;
        };
        if keyword.namespace().is_some() || keyword.name() != "require" {
            continue;
        }
        for spec in &form_items[1..] {
            if let Some(r) = parse_require_spec(spec) {
                requires.push(r);
            }
        }
    }

    Some(NamespaceInfo { name, requires })
}

fn parse_require_spec(spec: &Value) -> Option<RequireClause> {
    match spec {
        Value::Symbol(s) if !s.is_qualified() => Some(RequireClause {
            namespace: s.name.to_string(),
            alias: None,
            refer: Vec::new(),
        }),
        Value::Vector(v) => {
            let items: Vec<Value> = v.iter().cloned().collect();
            let namespace = items.first()?.as_symbol()?.name.to_string();
            let mut alias = None;
            let mut refer = Vec::new();
            let mut i = 1;
            while i + 1 < items.len() {
                let keyword = items[i].as_keyword()?;
                match keyword.name() {
                    "as" => alias = items[i + 1].as_symbol().map(|s| s.name.to_string()),
                    "refer" => {
                        if let Value::Vector(names) = &items[i + 1] {
                            refer = names.iter().filter_map(|v| v.as_symbol().map(|s| s.name.to_string())).collect();
                        }
                    }
                    _ => {}
                }
                i += 2;
            }
            Some(RequireClause { namespace, alias, refer })
        }
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedFile {
    pub path: PathBuf,
    pub source: String,
    pub namespace: NamespaceInfo,
}

/// A `(file, required-namespace)` pair whose target namespace has no node in
/// the graph — advisory information, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedRequire {
    pub file: PathBuf,
    pub namespace: String,
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub order: Vec<ResolvedFile>,
    pub unresolved: Vec<UnresolvedRequire>,
}

/// Builds the namespace dependency graph from `(path, source)` pairs, then
/// returns a leaves-first load order. Files whose first form isn't `(ns ...)`
/// are dropped from the graph entirely (not an error).
pub fn resolve(files: &[(PathBuf, String)]) -> Result<Resolution, DependencyError> {
    let mut graph: DiGraph<PathBuf, ()> = DiGraph::new();
    let mut node_of_path: HashMap<&Path, NodeIndex> = HashMap::new();
    let mut info_of_path: HashMap<PathBuf, NamespaceInfo> = HashMap::new();
    let mut node_of_ns: HashMap<String, NodeIndex> = HashMap::new();

    for (path, source) in files {
        let Some(info) = extract_ns_info(source) else { continue };
        let idx = graph.add_node(path.clone());
        node_of_path.insert(path.as_path(), idx);
        node_of_ns.insert(info.name.clone(), idx);
        info_of_path.insert(path.clone(), info);
    }

    let mut unresolved = Vec::new();
    for (path, source) in files {
        let Some(info) = extract_ns_info(source) else { continue };
        let from = node_of_path[path.as_path()];
        for req in &info.requires {
            match node_of_ns.get(&req.namespace) {
                Some(&to) => {
                    graph.update_edge(to, from, ());
                }
                None => unresolved.push(UnresolvedRequire {
                    file: path.clone(),
                    namespace: req.namespace.clone(),
                }),
            }
        }
    }

    match toposort(&graph, None) {
        Ok(order) => {
            let order = order
                .into_iter()
                .map(|idx| {
                    let path = graph[idx].clone();
                    let namespace = info_of_path.remove(&path).expect("graph node always has namespace info");
                    ResolvedFile { path, source: String::new(), namespace }
                })
                .map(|mut rf| {
                    rf.source = files.iter().find(|(p, _)| *p == rf.path).map(|(_, s)| s.clone()).unwrap_or_default();
                    rf
                })
                .collect();
            Ok(Resolution { order, unresolved })
        }
        Err(_) => {
            let cycles = tarjan_scc(&graph)
                .into_iter()
                .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
                .map(|scc| {
                    let mut names: Vec<String> = scc.iter().map(|&idx| namespace_name(&graph, idx, &info_of_path)).collect();
                    names.push(names[0].clone());
                    Cycle(names)
                })
                .collect();
            Err(DependencyError { cycles })
        }
    }
}

fn namespace_name(graph: &DiGraph<PathBuf, ()>, idx: NodeIndex, info: &HashMap<PathBuf, NamespaceInfo>) -> String {
    info.get(&graph[idx]).map(|i| i.name.clone()).unwrap_or_else(|| graph[idx].display().to_string())
}

/// Probes `root/a/b/c.{cljr,clj,cljc}` under each configured search root for a
/// namespace name like `a.b.c`; the first existing file wins. Existence
/// checks only — never reads file contents.
pub fn search_roots(config: &ResolverConfig, ns_name: &str) -> Option<PathBuf> {
    let relative: PathBuf = ns_name.split('.').collect();
    for root in &config.search_roots {
        for ext in ["cljr", "clj", "cljc"] {
            let candidate = root.join(&relative).with_extension(ext);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }
    None
}
