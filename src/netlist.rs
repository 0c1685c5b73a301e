//! Netlist synthesis.
//!
//! Converts each placed component into one textual record:
//!
//! ```text
//! <name> <node>... [<kind>] [<value>] [<initial_value>] ; <placement>[, <attrs>]
//! ```
//!
//! The placement attribute is inferred back from the two terminal
//! positions and the sheet's grid step, so the external analysis engine
//! can redraw the schematic exactly as placed. Synthesis is a pure
//! function of the sheet state: two calls without an intervening mutation
//! yield byte-identical output.

use crate::components::Component;
use crate::error::{GridnetError, Result};
use crate::sheet::{NodeId, Sheet};

/// Synthesize one record per component, in insertion order, each
/// newline-terminated.
pub(crate) fn render(sheet: &Sheet) -> Result<String> {
    let mut out = String::new();
    for cpt in sheet.components().iter() {
        // Ground flags have no element grammar downstream; their effect
        // is their node holding ID 0.
        if cpt.nodes().len() < 2 {
            continue;
        }
        out.push_str(&record(cpt, sheet)?);
        out.push('\n');
    }
    Ok(out)
}

fn record(cpt: &Component, sheet: &Sheet) -> Result<String> {
    let registry = sheet.nodes();
    let mut parts: Vec<String> = vec![cpt.name().to_string()];

    for &node in cpt.nodes() {
        parts.push(registry.name_of(node));
    }

    // Control references come directly after the output nodes, where the
    // downstream grammar expects them.
    if let Some(ctrl) = cpt.controlled_source() {
        let control = ctrl
            .control
            .as_deref()
            .ok_or_else(|| GridnetError::MissingControlReference {
                name: cpt.name().to_string(),
            })?;
        let target = sheet.components().get(control)?;
        if ctrl.kind.is_voltage_controlled() {
            let nodes = target.nodes();
            if nodes.len() < 2 {
                return Err(GridnetError::unknown_component(control));
            }
            parts.push(registry.name_of(nodes[0]));
            parts.push(registry.name_of(nodes[1]));
        } else {
            parts.push(control.to_string());
        }
    }

    if let Some(kind) = cpt.source_kind() {
        parts.push(kind.tag().to_string());
    }

    if cpt.kind().carries_value() {
        let value = cpt.value();
        let initial = cpt.initial_value();
        // An unset value is implicitly the display name and is omitted,
        // unless an initial condition needs the value token as a
        // positional placeholder.
        let emit_value = value.map_or(false, |v| v != cpt.name()) || initial.is_some();
        if emit_value {
            parts.push(wrap_token(value.unwrap_or_else(|| cpt.name())));
        }
        if let Some(iv) = initial {
            parts.push(wrap_token(iv));
        }
    }

    let (p1, p2) = terminal_pair(cpt, sheet)?;
    let mut attr = placement_attr(p1, p2, sheet.step);
    if !cpt.attrs().is_empty() {
        attr.push_str(", ");
        attr.push_str(cpt.attrs());
    }

    Ok(format!("{} ; {}", parts.join(" "), attr))
}

fn terminal_pair(cpt: &Component, sheet: &Sheet) -> Result<((i64, i64), (i64, i64))> {
    let registry = sheet.nodes();
    let position = |id: NodeId| {
        registry
            .node(id)
            .map(|n| n.position)
            .ok_or_else(|| GridnetError::unknown_node(id.to_string()))
    };
    let nodes = cpt.nodes();
    Ok((position(nodes[0])?, position(nodes[1])?))
}

/// Infer the placement attribute from the terminal positions.
///
/// Axis-aligned components get a direction plus a `=<r>` size suffix when
/// the length differs from one grid step; anything else gets an unsnapped
/// `rotate=<degrees>`.
fn placement_attr(p1: (i64, i64), p2: (i64, i64), step: f64) -> String {
    let dx = (p2.0 - p1.0) as f64;
    let dy = (p2.1 - p1.1) as f64;
    let r = (dx * dx + dy * dy).sqrt() / step;

    let size = if (r - 1.0).abs() < 1e-9 {
        String::new()
    } else {
        format!("={}", format_number(r))
    };

    if p1.1 == p2.1 {
        if p1.0 > p2.0 {
            format!("left{}", size)
        } else {
            format!("right{}", size)
        }
    } else if p1.0 == p2.0 {
        if p1.1 > p2.1 {
            format!("down{}", size)
        } else {
            format!("up{}", size)
        }
    } else {
        format!("rotate={}", format_number(dy.atan2(dx).to_degrees()))
    }
}

/// Format with trailing zeros and a trailing decimal point stripped:
/// `2`, `1.5`, never `1.50` or `1.`.
fn format_number(v: f64) -> String {
    let s = format!("{}", v);
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

/// Wrap non-alphanumeric values so they parse as a single token.
fn wrap_token(s: &str) -> String {
    if s.chars().all(char::is_alphanumeric) {
        s.to_string()
    } else {
        format!("{{{}}}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Kind, SourceKind};
    use approx::assert_relative_eq;

    fn sheet() -> Sheet {
        Sheet::new("test", "nobody")
    }

    #[test]
    fn test_resistor_right() {
        let mut sheet = sheet();
        sheet.place(Kind::Resistor, (0.0, 0.0), (2.0, 0.0)).unwrap();
        assert_eq!(sheet.netlist().unwrap(), "R1 1 2 ; right\n");
    }

    #[test]
    fn test_directions_and_scale() {
        let mut sheet = sheet();
        sheet.place(Kind::Wire, (0.0, 0.0), (0.0, 4.0)).unwrap();
        sheet.place(Kind::Wire, (4.0, 4.0), (0.0, 4.0)).unwrap();
        sheet.place(Kind::Wire, (4.0, 4.0), (4.0, 2.0)).unwrap();
        let netlist = sheet.netlist().unwrap();
        let lines: Vec<&str> = netlist.lines().collect();
        assert_eq!(lines[0], "W1 1 2 ; up=2");
        assert_eq!(lines[1], "W2 3 2 ; left=2");
        assert_eq!(lines[2], "W3 3 4 ; down");
    }

    #[test]
    fn test_fractional_scale() {
        let mut sheet = sheet();
        sheet.place(Kind::Resistor, (0.0, 0.0), (2.0, 0.0)).unwrap();
        sheet.step = 4.0;
        assert_eq!(sheet.netlist().unwrap(), "R1 1 2 ; right=0.5\n");
    }

    #[test]
    fn test_diagonal_rotation() {
        let mut sheet = sheet();
        sheet.place(Kind::Resistor, (0.0, 0.0), (2.0, 2.0)).unwrap();
        assert_eq!(sheet.netlist().unwrap(), "R1 1 2 ; rotate=45\n");

        let attr = placement_attr((0, 0), (-2, 2), 2.0);
        assert_eq!(attr, "rotate=135");
    }

    #[test]
    fn test_rotation_angle_unsnapped() {
        let dx = 4.0f64;
        let dy = 2.0f64;
        let expected = dy.atan2(dx).to_degrees();
        assert_relative_eq!(expected, 26.565051177077994, max_relative = 1e-12);
        let attr = placement_attr((0, 0), (4, 2), 2.0);
        assert_eq!(attr, format!("rotate={}", format_number(expected)));
    }

    #[test]
    fn test_value_and_wrapping() {
        let mut sheet = sheet();
        sheet.place(Kind::Resistor, (0.0, 0.0), (2.0, 0.0)).unwrap();
        sheet.place(Kind::Resistor, (0.0, 2.0), (2.0, 2.0)).unwrap();
        sheet.set_value("R1", Some("10k".to_string())).unwrap();
        sheet.set_value("R2", Some("R/2".to_string())).unwrap();
        let netlist = sheet.netlist().unwrap();
        let lines: Vec<&str> = netlist.lines().collect();
        assert_eq!(lines[0], "R1 1 2 10k ; right");
        assert_eq!(lines[1], "R2 3 4 {R/2} ; right");
    }

    #[test]
    fn test_value_equal_to_name_is_omitted() {
        let mut sheet = sheet();
        sheet.place(Kind::Resistor, (0.0, 0.0), (2.0, 0.0)).unwrap();
        sheet.set_value("R1", Some("R1".to_string())).unwrap();
        assert_eq!(sheet.netlist().unwrap(), "R1 1 2 ; right\n");
    }

    #[test]
    fn test_initial_value_keeps_value_token() {
        let mut sheet = sheet();
        sheet.place(Kind::Capacitor, (0.0, 0.0), (2.0, 0.0)).unwrap();
        sheet.set_initial_value("C1", Some("5".to_string())).unwrap();
        assert_eq!(sheet.netlist().unwrap(), "C1 1 2 C1 5 ; right\n");

        sheet.set_value("C1", Some("100n".to_string())).unwrap();
        assert_eq!(sheet.netlist().unwrap(), "C1 1 2 100n 5 ; right\n");
    }

    #[test]
    fn test_source_kind_tag() {
        let mut sheet = sheet();
        sheet
            .place(Kind::VoltageSource, (0.0, 2.0), (0.0, 0.0))
            .unwrap();
        sheet.set_value("V1", Some("5".to_string())).unwrap();
        sheet
            .set_source_kind("V1", Some(SourceKind::Dc))
            .unwrap();
        assert_eq!(sheet.netlist().unwrap(), "V1 1 2 dc 5 ; down\n");
    }

    #[test]
    fn test_wires_and_ports_never_carry_values() {
        let mut sheet = sheet();
        sheet.place(Kind::Port, (0.0, 0.0), (2.0, 0.0)).unwrap();
        sheet.set_value("P1", Some("ignored".to_string())).unwrap();
        assert_eq!(sheet.netlist().unwrap(), "P1 1 2 ; right\n");
    }

    #[test]
    fn test_ground_flag_emits_no_record() {
        let mut sheet = sheet();
        sheet.place(Kind::Resistor, (0.0, 0.0), (2.0, 0.0)).unwrap();
        sheet.place_ground((0.0, 0.0)).unwrap();
        assert_eq!(sheet.netlist().unwrap(), "R1 0 2 ; right\n");
    }

    #[test]
    fn test_voltage_controlled_source_appends_control_nodes() {
        let mut sheet = sheet();
        sheet.place(Kind::Resistor, (0.0, 0.0), (2.0, 0.0)).unwrap();
        sheet.place(Kind::Vcvs, (0.0, 2.0), (2.0, 2.0)).unwrap();
        sheet.set_control("E1", Some("R1".to_string())).unwrap();
        sheet.set_value("E1", Some("2".to_string())).unwrap();
        let netlist = sheet.netlist().unwrap();
        assert_eq!(netlist.lines().nth(1).unwrap(), "E1 3 4 1 2 2 ; right");
    }

    #[test]
    fn test_current_controlled_source_appends_control_name() {
        let mut sheet = sheet();
        sheet.place(Kind::Resistor, (0.0, 0.0), (2.0, 0.0)).unwrap();
        sheet.place(Kind::Cccs, (0.0, 2.0), (2.0, 2.0)).unwrap();
        sheet.set_control("F1", Some("R1".to_string())).unwrap();
        let netlist = sheet.netlist().unwrap();
        assert_eq!(netlist.lines().nth(1).unwrap(), "F1 3 4 R1 ; right");
    }

    #[test]
    fn test_missing_control_is_an_error() {
        let mut sheet = sheet();
        sheet.place(Kind::Ccvs, (0.0, 0.0), (2.0, 0.0)).unwrap();
        assert_eq!(
            sheet.netlist(),
            Err(GridnetError::MissingControlReference {
                name: "H1".to_string()
            })
        );
    }

    #[test]
    fn test_free_attrs_appended_after_placement() {
        let mut sheet = sheet();
        sheet.place(Kind::Resistor, (0.0, 0.0), (2.0, 0.0)).unwrap();
        sheet
            .set_attrs("R1", "color=blue, thick".to_string())
            .unwrap();
        assert_eq!(sheet.netlist().unwrap(), "R1 1 2 ; right, color=blue, thick\n");
    }

    #[test]
    fn test_synthesis_is_deterministic() {
        let mut sheet = sheet();
        sheet.place(Kind::Resistor, (0.0, 0.0), (2.0, 0.0)).unwrap();
        sheet.place(Kind::Capacitor, (2.0, 0.0), (2.0, 2.0)).unwrap();
        sheet.place_ground((0.0, 0.0)).unwrap();
        let first = sheet.netlist().unwrap();
        let second = sheet.netlist().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_format_number_strips_trailing_zeros() {
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(10.0), "10");
    }
}
