//! Load-collaborator contract.
//!
//! Reconstructs a [`Sheet`] from a previously-parsed external circuit
//! object: one [`ElementDef`] per element plus one [`NodePlacement`] per
//! node, as exposed by the external analysis engine's parser and schematic
//! layout. Controlled-source references are queued and resolved in a
//! second pass, since the controlling element may be declared later in the
//! source.

use std::collections::HashMap;

use log::debug;

use crate::components::{Component, Kind, SourceKind};
use crate::error::{GridnetError, Result};
use crate::sheet::{NodeId, Sheet};

/// Placement attribute keys; everything else in `opts` is passed through
/// as the component's free-attrs string.
const PLACEMENT_KEYS: &[&str] = &["left", "right", "up", "down", "rotate", "size"];

/// One element of a parsed external circuit.
#[derive(Debug, Clone, Default)]
pub struct ElementDef {
    /// Element type letter (`R`, `C`, `L`, `V`, `I`, `E`, `F`, `G`, `H`,
    /// `W`, `P`), or `XX` for directives, which are skipped.
    pub etype: String,
    /// Element name, e.g. `R1`.
    pub name: String,
    /// Node names in terminal order. Voltage-controlled sources carry
    /// their two sensing nodes at positions 2 and 3.
    pub nodes: Vec<String>,
    /// Positional arguments after the nodes (value, initial value, …).
    pub args: Vec<String>,
    /// Source keyword (`dc`, `ac`, `step`), if present.
    pub keyword: Option<String>,
    /// Schematic options, in source order.
    pub opts: Vec<(String, String)>,
}

/// Where the external layout placed a named node.
#[derive(Debug, Clone)]
pub struct NodePlacement {
    pub name: String,
    pub position: (f64, f64),
}

impl Sheet {
    /// Reconstruct a sheet from parsed elements and node placements.
    pub fn from_elements(
        name: impl Into<String>,
        author: impl Into<String>,
        elements: &[ElementDef],
        placements: &[NodePlacement],
    ) -> Result<Self> {
        let mut sheet = Sheet::new(name, author);
        let positions: HashMap<&str, (f64, f64)> = placements
            .iter()
            .map(|p| (p.name.as_str(), p.position))
            .collect();

        // (dependent source name, sensing node pair) queued for pass two.
        let mut pending: Vec<(String, String, String)> = Vec::new();

        for elt in elements {
            if elt.etype == "XX" {
                continue;
            }
            let kind = Kind::from_type(&elt.etype).ok_or_else(|| {
                GridnetError::UnknownElementType {
                    etype: elt.etype.clone(),
                    name: elt.name.clone(),
                }
            })?;
            if elt.nodes.len() < 2 {
                return Err(GridnetError::invalid_geometry(
                    kind.label(),
                    format!("element '{}' names {} nodes", elt.name, elt.nodes.len()),
                ));
            }

            let mut nodes = Vec::with_capacity(2);
            for node_name in elt.nodes.iter().take(2) {
                let &pos = positions
                    .get(node_name.as_str())
                    .ok_or_else(|| GridnetError::unknown_node(node_name.as_str()))?;
                let snapped = sheet.snap(pos.0, pos.1);
                let mut id = sheet
                    .registry
                    .resolve_or_create(snapped, Some(node_name.as_str()))?;
                if node_name == "0" && !id.is_ground() {
                    sheet.mark_ground(id)?;
                    id = NodeId::GROUND;
                }
                nodes.push(id);
            }

            let mut cpt = Component::assemble(kind, elt.name.clone(), &nodes);
            match kind {
                Kind::Resistor => cpt.set_value(elt.args.first().cloned()),
                Kind::Capacitor | Kind::Inductor => {
                    cpt.set_value(elt.args.first().cloned());
                    cpt.set_initial_value(elt.args.get(1).cloned());
                }
                Kind::VoltageSource | Kind::CurrentSource => {
                    cpt.set_value(elt.args.first().cloned());
                    if let Some(keyword) = &elt.keyword {
                        cpt.set_source_kind(SourceKind::from_tag(
                            keyword.to_ascii_lowercase().as_str(),
                        ));
                    }
                }
                Kind::Vcvs | Kind::Vccs => {
                    cpt.set_value(elt.args.first().cloned());
                    if let (Some(n1), Some(n2)) = (elt.nodes.get(2), elt.nodes.get(3)) {
                        pending.push((elt.name.clone(), n1.clone(), n2.clone()));
                    }
                }
                Kind::Cccs | Kind::Ccvs => {
                    cpt.set_control(elt.args.first().cloned());
                    cpt.set_value(elt.args.get(1).cloned());
                }
                Kind::Wire | Kind::Port | Kind::Ground => {}
            }

            let attrs: Vec<String> = elt
                .opts
                .iter()
                .filter(|(key, _)| !PLACEMENT_KEYS.contains(&key.as_str()))
                .map(|(key, val)| {
                    if val.is_empty() {
                        key.clone()
                    } else {
                        format!("{}={}", key, val)
                    }
                })
                .collect();
            cpt.set_attrs(attrs.join(", "));

            sheet.store.add(cpt)?;
            for &id in &nodes {
                sheet.registry.acquire(id);
            }
        }

        // Second pass: the sensing pair names a component that may have
        // been declared after the dependent source.
        for (name, n1, n2) in pending {
            let control = sheet
                .store
                .find_by_terminals(&n1, &n2, &sheet.registry)?
                .name()
                .to_string();
            sheet.store.get_mut(&name)?.set_control(Some(control));
        }

        debug!(
            "loaded sheet '{}': {} components, {} nodes",
            sheet.name,
            sheet.store.len(),
            sheet.registry.len()
        );
        Ok(sheet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(etype: &str, name: &str, nodes: &[&str], args: &[&str]) -> ElementDef {
        ElementDef {
            etype: etype.to_string(),
            name: name.to_string(),
            nodes: nodes.iter().map(|s| s.to_string()).collect(),
            args: args.iter().map(|s| s.to_string()).collect(),
            keyword: None,
            opts: Vec::new(),
        }
    }

    fn at(name: &str, x: f64, y: f64) -> NodePlacement {
        NodePlacement {
            name: name.to_string(),
            position: (x, y),
        }
    }

    #[test]
    fn test_load_simple_resistor() {
        let elements = [def("R", "R1", &["1", "2"], &["10k"])];
        let placements = [at("1", 0.0, 0.0), at("2", 2.0, 0.0)];
        let sheet = Sheet::from_elements("rc", "nobody", &elements, &placements).unwrap();
        assert_eq!(sheet.netlist().unwrap(), "R1 1 2 10k ; right\n");
    }

    #[test]
    fn test_load_marks_ground_from_node_zero() {
        let elements = [def("V", "V1", &["1", "0"], &["5"])];
        let placements = [at("1", 0.0, 2.0), at("0", 0.0, 0.0)];
        let sheet = Sheet::from_elements("s", "nobody", &elements, &placements).unwrap();
        assert!(sheet.ground_node().is_some());
        assert_eq!(sheet.netlist().unwrap(), "V1 1 0 5 ; down\n");
    }

    #[test]
    fn test_load_source_keyword_and_initial_value() {
        let mut vdef = def("V", "V1", &["1", "0"], &["5"]);
        vdef.keyword = Some("dc".to_string());
        let cdef = def("C", "C1", &["1", "0"], &["100n", "2"]);
        let placements = [at("1", 0.0, 2.0), at("0", 0.0, 0.0)];
        let sheet =
            Sheet::from_elements("s", "nobody", &[vdef, cdef], &placements).unwrap();
        let netlist = sheet.netlist().unwrap();
        let lines: Vec<&str> = netlist.lines().collect();
        assert_eq!(lines[0], "V1 1 0 dc 5 ; down");
        assert_eq!(lines[1], "C1 1 0 100n 2 ; down");
    }

    #[test]
    fn test_load_resolves_forward_control_reference() {
        // E1 senses the terminals of R1, declared after it.
        let edef = def("E", "E1", &["3", "4", "1", "2"], &["2"]);
        let rdef = def("R", "R1", &["1", "2"], &["1k"]);
        let placements = [
            at("1", 0.0, 0.0),
            at("2", 2.0, 0.0),
            at("3", 0.0, 2.0),
            at("4", 2.0, 2.0),
        ];
        let sheet =
            Sheet::from_elements("s", "nobody", &[edef, rdef], &placements).unwrap();
        let ctrl = sheet.get("E1").unwrap().controlled_source().unwrap();
        assert_eq!(ctrl.control.as_deref(), Some("R1"));
        assert_eq!(
            sheet.netlist().unwrap().lines().next().unwrap(),
            "E1 3 4 1 2 2 ; right"
        );
    }

    #[test]
    fn test_load_current_controlled_arg_order() {
        let fdef = def("F", "F1", &["3", "4"], &["V1", "2"]);
        let vdef = def("V", "V1", &["1", "0"], &["5"]);
        let placements = [
            at("0", 0.0, 0.0),
            at("1", 0.0, 2.0),
            at("3", 2.0, 0.0),
            at("4", 4.0, 0.0),
        ];
        let sheet =
            Sheet::from_elements("s", "nobody", &[fdef, vdef], &placements).unwrap();
        assert_eq!(
            sheet.netlist().unwrap().lines().next().unwrap(),
            "F1 3 4 V1 2 ; right"
        );
    }

    #[test]
    fn test_load_passes_styling_opts_through() {
        let mut rdef = def("R", "R1", &["1", "2"], &[]);
        rdef.opts = vec![
            ("right".to_string(), "2".to_string()),
            ("color".to_string(), "blue".to_string()),
            ("thick".to_string(), String::new()),
        ];
        let placements = [at("1", 0.0, 0.0), at("2", 4.0, 0.0)];
        let sheet = Sheet::from_elements("s", "nobody", &[rdef], &placements).unwrap();
        assert_eq!(
            sheet.netlist().unwrap(),
            "R1 1 2 ; right=2, color=blue, thick\n"
        );
    }

    #[test]
    fn test_load_skips_directives_and_rejects_unknown_types() {
        let skip = def("XX", "XX1", &[], &[]);
        let sheet = Sheet::from_elements("s", "nobody", &[skip], &[]).unwrap();
        assert!(sheet.components().is_empty());

        let bogus = def("Z", "Z1", &["1", "2"], &[]);
        let err = Sheet::from_elements("s", "nobody", &[bogus], &[]).unwrap_err();
        assert_eq!(
            err,
            GridnetError::UnknownElementType {
                etype: "Z".to_string(),
                name: "Z1".to_string()
            }
        );
    }

    #[test]
    fn test_load_requires_placements() {
        let rdef = def("R", "R1", &["1", "2"], &[]);
        let err =
            Sheet::from_elements("s", "nobody", &[rdef], &[at("1", 0.0, 0.0)]).unwrap_err();
        assert_eq!(
            err,
            GridnetError::UnknownNode {
                name: "2".to_string()
            }
        );
    }

    #[test]
    fn test_round_trip_is_equivalent() {
        // Build interactively, synthesize, then re-load the records the
        // external parser would hand back.
        let mut original = Sheet::new("rt", "nobody");
        original
            .place(crate::components::Kind::Resistor, (0.0, 2.0), (2.0, 2.0))
            .unwrap();
        original.set_value("R1", Some("10k".to_string())).unwrap();
        original
            .place(crate::components::Kind::Wire, (0.0, 2.0), (0.0, 0.0))
            .unwrap();
        original.place_ground((0.0, 0.0)).unwrap();
        let first = original.netlist().unwrap();
        assert_eq!(first, "R1 1 2 10k ; right\nW1 1 0 ; down\n");

        let elements = [
            def("R", "R1", &["1", "2"], &["10k"]),
            def("W", "W1", &["1", "0"], &[]),
        ];
        let placements = [
            at("1", 0.0, 2.0),
            at("2", 2.0, 2.0),
            at("0", 0.0, 0.0),
        ];
        let reloaded =
            Sheet::from_elements("rt", "nobody", &elements, &placements).unwrap();
        assert_eq!(reloaded.netlist().unwrap(), first);
    }
}
