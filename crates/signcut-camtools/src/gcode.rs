//! Pieces shared by the G-code emitters.

use crate::sequencer::{ToolOperation, Toolpath, MIN_RAPID_MM};
use signcut_core::units::format_coord;
use signcut_core::{CutClass, EmitError, Point};

/// Consecutive operations that belong to one contour
#[derive(Debug, Clone, Copy)]
pub struct OperationGroup<'a> {
    pub part_id: Option<u32>,
    pub contour: Option<usize>,
    pub ops: &'a [ToolOperation],
}

impl<'a> OperationGroup<'a> {
    pub fn rapids(&self) -> impl Iterator<Item = &'a ToolOperation> {
        self.ops
            .iter()
            .filter(|op| !op.is_cut() && op.length() > MIN_RAPID_MM)
    }

    pub fn cuts(&self) -> impl Iterator<Item = &'a ToolOperation> {
        self.ops.iter().filter(|op| op.is_cut())
    }

    pub fn cut_class(&self) -> Option<CutClass> {
        self.cuts().find_map(|op| op.cut_class)
    }

    /// Whether the cutting moves end where they started.
    pub fn is_closed(&self) -> bool {
        let mut cuts = self.cuts();
        match (cuts.next(), cuts.last()) {
            (Some(first), Some(last)) => {
                signcut_core::dist_sq(first.start, last.end)
                    <= signcut_core::geometry::CLOSED_TOLERANCE_SQ
            }
            _ => false,
        }
    }

    /// Comment text naming the contour.
    pub fn label(&self) -> String {
        match (self.part_id, self.cut_class()) {
            (Some(id), Some(class)) => format!("Part {} {}", id, class),
            (Some(id), None) => format!("Part {}", id),
            _ => "Continuous path".to_string(),
        }
    }
}

/// Split operations wherever the part or contour changes.
pub fn group_operations(ops: &[ToolOperation]) -> Vec<OperationGroup<'_>> {
    let mut groups = Vec::new();
    let mut start = 0;
    for i in 1..=ops.len() {
        let boundary = i == ops.len()
            || (ops[i].part_id, ops[i].contour) != (ops[start].part_id, ops[start].contour);
        if boundary {
            groups.push(OperationGroup {
                part_id: ops[start].part_id,
                contour: ops[start].contour,
                ops: &ops[start..i],
            });
            start = i;
        }
    }
    groups
}

/// Refuse toolpaths that must not reach a machine.
pub fn validate(toolpath: &Toolpath) -> Result<(), EmitError> {
    if toolpath.is_empty() {
        return Err(EmitError::EmptyToolpath);
    }
    if let Some(index) = toolpath.operations.iter().position(|op| !op.is_finite()) {
        return Err(EmitError::NonFiniteCoordinate { index });
    }
    Ok(())
}

/// `X.. Y..` words at three decimals.
pub fn xy(p: Point) -> String {
    format!("X{} Y{}", format_coord(p.x), format_coord(p.y))
}

fn first_word(line: &str) -> &str {
    line.split_whitespace().next().unwrap_or("")
}

/// Drop `M5` lines issued while the spindle is already off.
pub fn remove_redundant_m5(lines: Vec<String>) -> Vec<String> {
    let mut result = Vec::with_capacity(lines.len());
    let mut off = false;

    for line in lines {
        match first_word(&line) {
            "M5" => {
                if off {
                    continue;
                }
                off = true;
            }
            "M3" => off = false,
            _ => {}
        }
        result.push(line);
    }
    result
}
