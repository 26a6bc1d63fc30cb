//! Schema loading, raw-word parsing and rendering for `packstate-inspect`.

use anyhow::{Context, Result, bail};
use packstate_state::{
    BitLayoutPlan, FieldCodec, FieldSlot, FieldValue, PackedState, StateSchema,
};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Reads a JSON schema from `path` and plans its layout.
pub fn load_layout(path: &Path) -> Result<Arc<BitLayoutPlan>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema {}", path.display()))?;
    let schema = StateSchema::from_json(&json)
        .with_context(|| format!("Failed to parse schema {}", path.display()))?;
    debug!("Loaded schema {} with {} fields", schema.name, schema.fields.len());
    let plan = BitLayoutPlan::plan(&schema)
        .with_context(|| format!("Cannot lay out {}", schema.name))?;
    Ok(Arc::new(plan))
}

/// Parses a raw word written in decimal, `0x` hex or `0b` binary.
///
/// Underscores between digits are ignored.
pub fn parse_raw(input: &str) -> Result<u64> {
    let cleaned: String = input.trim().chars().filter(|c| *c != '_').collect();
    let lower = cleaned.to_ascii_lowercase();
    let parsed = if let Some(hex) = lower.strip_prefix("0x") {
        u64::from_str_radix(hex, 16)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        u64::from_str_radix(bin, 2)
    } else {
        lower.parse()
    };
    parsed.with_context(|| format!("Invalid raw value {input:?}"))
}

/// Parses one `field=value` assignment against `layout`.
///
/// Booleans are `true` or `false`, enum members are given by name or ordinal
/// and integers in decimal.
pub fn parse_assignment(layout: &BitLayoutPlan, input: &str) -> Result<(usize, FieldValue)> {
    let Some((field, value)) = input.split_once('=') else {
        bail!("Expected field=value but got {input:?}");
    };
    let (field, value) = (field.trim(), value.trim());
    let index = layout
        .index_of(field)
        .with_context(|| format!("{} has no field named {field}", layout.name()))?;
    let slot = &layout.fields()[index];
    Ok((index, parse_value(slot, value)?))
}

fn parse_value(slot: &FieldSlot, value: &str) -> Result<FieldValue> {
    let parsed = match slot.codec() {
        FieldCodec::Bool => match value {
            "true" => FieldValue::Bool(true),
            "false" => FieldValue::Bool(false),
            _ => bail!("{} expects true or false but got {value:?}", slot.name()),
        },
        FieldCodec::Int { .. } | FieldCodec::Ranged { .. } => FieldValue::Int(
            value
                .parse()
                .with_context(|| format!("{} expects an integer but got {value:?}", slot.name()))?,
        ),
        FieldCodec::Enum { members } => match slot.codec().ordinal_of(value) {
            Some(ordinal) => FieldValue::Enum(ordinal),
            None => FieldValue::Enum(value.parse().with_context(|| {
                format!(
                    "{} expects one of {} but got {value:?}",
                    slot.name(),
                    members.join(", ")
                )
            })?),
        },
    };
    Ok(parsed)
}

/// Applies assignments in order, starting from the all-zero state.
pub fn encode<'a>(
    layout: &Arc<BitLayoutPlan>,
    assignments: impl IntoIterator<Item = &'a str>,
) -> Result<PackedState> {
    let mut state = PackedState::initial(Arc::clone(layout));
    for assignment in assignments {
        let (index, value) = parse_assignment(layout, assignment)?;
        state = state
            .with_at(index, value)
            .with_context(|| format!("Cannot apply {assignment:?}"))?;
    }
    Ok(state)
}

/// Validates a raw word against `layout`.
pub fn decode(layout: &Arc<BitLayoutPlan>, raw: u64) -> Result<PackedState> {
    PackedState::new(Arc::clone(layout), raw)
        .with_context(|| format!("{raw:#x} is not a valid {}", layout.name()))
}

/// Renders a layout as a table, one row per field.
#[must_use]
pub fn render_plan(layout: &BitLayoutPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}: {} of {} bits used, unused mask {:#x}{}",
        layout.name(),
        layout.total_bits(),
        layout.backing().bits(),
        layout.unused_mask(),
        if layout.change_support() {
            ", change support"
        } else {
            ""
        }
    );
    let name_width = layout
        .fields()
        .iter()
        .map(|f| f.name().len())
        .max()
        .unwrap_or(0)
        .max("field".len());
    let _ = writeln!(
        out,
        "{:>3}  {:<name_width$}  {:<8}  {:>5}  {:>4}  {:<18}  values",
        "#", "field", "kind", "start", "bits", "mask"
    );
    for (i, slot) in layout.fields().iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>3}  {:<name_width$}  {:<8}  {:>5}  {:>4}  {:<18}  {}",
            i,
            slot.name(),
            slot.kind().to_string(),
            slot.starting_bit(),
            slot.width(),
            format!("{:#x}", slot.mask()),
            describe_values(slot.codec())
        );
    }
    out
}

fn describe_values(codec: &FieldCodec) -> String {
    match codec {
        FieldCodec::Bool => "false|true".to_string(),
        FieldCodec::Int { min, max, .. } | FieldCodec::Ranged { min, max } => {
            format!("{min}..={max}")
        }
        FieldCodec::Enum { members } => members.join("|"),
    }
}

/// Renders a state: its one-line form, then one row per field.
#[must_use]
pub fn render_state(state: &PackedState) -> String {
    let mut out = format!("{state}\n");
    for (slot, value) in state.values() {
        let _ = writeln!(
            out,
            "  {} = {} (raw {:#b})",
            slot.name(),
            slot.codec().format_value(value),
            slot.extract(state.value())
        );
    }
    out
}

/// The layout as pretty-printed JSON.
pub fn plan_json(layout: &BitLayoutPlan) -> Result<String> {
    serde_json::to_string_pretty(layout).context("Failed to serialize layout")
}
