//! Slot builder: derives slot lists and default widget values from a
//! capability descriptor. Pure and stateless.
//!
//! Input ordering: required names in `input_order.required` sequence, then
//! optional names in `input_order.optional` sequence. Any declared name the
//! order lists miss is appended afterward (required before optional), so
//! every declared input produces exactly one slot even when the order list
//! is incomplete.

use std::collections::BTreeSet;

use serde_json::{json, Value};

use crate::registry::{InputOrder, InputSection, InputSpec};
use crate::slot::{
    InputSlot, OutputSlot, SlotType, WidgetDesc, WidgetKind, COMBO_TAG, CONTROL_COMPANION_DEFAULT,
};

/// Declared inputs in slot order: ordered names first, unlisted stragglers
/// appended (required before optional).
pub fn ordered_inputs<'a>(
    input: &'a InputSection,
    order: &'a InputOrder,
) -> Vec<(&'a str, &'a InputSpec)> {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut result = Vec::with_capacity(input.required.len() + input.optional.len());

    for name in &order.required {
        if let Some(spec) = input.required.get(name) {
            if seen.insert(name.as_str()) {
                result.push((name.as_str(), spec));
            }
        }
    }
    for name in &order.optional {
        if let Some(spec) = input.optional.get(name) {
            if seen.insert(name.as_str()) {
                result.push((name.as_str(), spec));
            }
        }
    }
    for (name, spec) in &input.required {
        if seen.insert(name.as_str()) {
            result.push((name.as_str(), spec));
        }
    }
    for (name, spec) in &input.optional {
        if seen.insert(name.as_str()) {
            result.push((name.as_str(), spec));
        }
    }

    result
}

/// Derives the widget descriptor for one declared input, or `None` for a
/// connection-only slot.
fn widget_for(name: &str, spec: &InputSpec) -> Option<WidgetDesc> {
    let config = spec.config();

    // Legacy combo form: the type position holds the options themselves.
    if let SlotType::Options(options) = spec.ty() {
        return Some(WidgetDesc::combo(name, options.clone()));
    }

    // Enumerable values or an upload affordance make any type selectable.
    if let Some(config) = config {
        if let Some(values) = &config.values {
            return Some(WidgetDesc::combo(name, values.clone()));
        }
        if config.image_upload == Some(true) {
            return Some(WidgetDesc::combo(name, Vec::new()));
        }
    }

    if !spec.ty().is_basic() {
        return None;
    }
    let kind = match spec.ty().as_tag()? {
        "INT" | "FLOAT" => WidgetKind::Number,
        "BOOLEAN" => WidgetKind::Toggle,
        _ => {
            if config.and_then(|c| c.multiline) == Some(true) {
                WidgetKind::Textarea
            } else {
                WidgetKind::Text
            }
        }
    };
    Some(WidgetDesc::new(kind, name))
}

/// Builds one input slot from its declared spec.
pub fn input_slot_from_spec(name: &str, spec: &InputSpec) -> InputSlot {
    let widget = widget_for(name, spec);
    let ty = match spec.ty() {
        // Combo slots are tagged COMBO; the options live in the widget.
        SlotType::Options(_) => SlotType::tag(COMBO_TAG),
        other => other.clone(),
    };

    let mut slot = InputSlot::new(name, ty);
    if let Some(widget) = widget {
        slot = slot.with_widget(widget);
    }
    slot
}

/// Builds the full input slot list for a capability descriptor.
pub fn build_input_slots(input: &InputSection, order: &InputOrder) -> Vec<InputSlot> {
    ordered_inputs(input, order)
        .into_iter()
        .map(|(name, spec)| input_slot_from_spec(name, spec))
        .collect()
}

/// Builds the output slot list; display names fall back to the type tag
/// when `output_name` is short.
pub fn build_output_slots(output: &[SlotType], output_name: &[String]) -> Vec<OutputSlot> {
    output
        .iter()
        .enumerate()
        .map(|(index, ty)| {
            let name = output_name
                .get(index)
                .cloned()
                .or_else(|| ty.as_tag().map(str::to_string))
                .unwrap_or_else(|| index.to_string());
            OutputSlot::new(name, ty.clone())
        })
        .collect()
}

/// Default widget values for one declared input: empty for connection-only
/// slots, one value for widget-bearing slots, and the control-mode
/// companion appended for seed-named integer slots.
pub fn default_values_for(name: &str, spec: &InputSpec) -> Vec<Value> {
    let slot = input_slot_from_spec(name, spec);
    let Some(widget) = &slot.widget else {
        return Vec::new();
    };

    let default = spec
        .config()
        .and_then(|config| config.default.clone())
        .unwrap_or_else(|| fallback_default(&slot, widget));

    let mut values = vec![default];
    if slot.has_control_companion() {
        values.push(json!(CONTROL_COMPANION_DEFAULT));
    }
    values
}

/// Type-specific fallback when the config declares no default.
fn fallback_default(slot: &InputSlot, widget: &WidgetDesc) -> Value {
    match widget.kind {
        WidgetKind::Combo => widget
            .options
            .as_ref()
            .and_then(|options| options.first().cloned())
            .unwrap_or_else(|| json!("")),
        WidgetKind::Number => {
            if slot.ty.as_tag() == Some("INT") {
                json!(0)
            } else {
                json!(0.0)
            }
        }
        WidgetKind::Toggle => json!(false),
        WidgetKind::Text | WidgetKind::Textarea | WidgetKind::Unknown => json!(""),
    }
}

/// Default `widgets_values` for a whole capability descriptor, in slot
/// order.
pub fn default_widget_values(input: &InputSection, order: &InputOrder) -> Vec<Value> {
    let mut values = Vec::new();
    for (name, spec) in ordered_inputs(input, order) {
        values.extend(default_values_for(name, spec));
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use serde_json::json;

    fn section(required: Vec<(&str, Value)>, optional: Vec<(&str, Value)>) -> InputSection {
        let parse = |entries: Vec<(&str, Value)>| -> IndexMap<String, InputSpec> {
            entries
                .into_iter()
                .map(|(name, raw)| (name.to_string(), serde_json::from_value(raw).unwrap()))
                .collect()
        };
        InputSection {
            required: parse(required),
            optional: parse(optional),
        }
    }

    fn order(required: Vec<&str>, optional: Vec<&str>) -> InputOrder {
        InputOrder {
            required: required.into_iter().map(String::from).collect(),
            optional: optional.into_iter().map(String::from).collect(),
        }
    }

    #[test]
    fn ordering_follows_order_lists() {
        let input = section(
            vec![("b", json!("INT")), ("a", json!("INT"))],
            vec![("c", json!("INT"))],
        );
        let order = order(vec!["a", "b"], vec!["c"]);

        let names: Vec<&str> = ordered_inputs(&input, &order)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn unlisted_names_appended_required_before_optional() {
        let input = section(
            vec![("listed", json!("INT")), ("straggler", json!("INT"))],
            vec![("opt_straggler", json!("INT"))],
        );
        let order = order(vec!["listed"], vec![]);

        let names: Vec<&str> = ordered_inputs(&input, &order)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["listed", "straggler", "opt_straggler"]);
    }

    #[test]
    fn every_declared_input_produces_exactly_one_slot() {
        let input = section(
            vec![("x", json!("INT")), ("y", json!("FLOAT"))],
            vec![("z", json!("IMAGE"))],
        );
        // Order list mentions a name that does not exist plus a duplicate.
        let order = order(vec!["y", "ghost", "y"], vec![]);

        let slots = build_input_slots(&input, &order);
        let names: Vec<&str> = slots.iter().map(|slot| slot.name.as_str()).collect();
        assert_eq!(names, vec!["y", "x", "z"]);
    }

    #[test]
    fn combo_slot_from_options_list() {
        let spec: InputSpec = serde_json::from_value(json!(["euler", "ddim"])).unwrap();
        let slot = input_slot_from_spec("sampler_name", &spec);

        assert_eq!(slot.ty.as_tag(), Some(COMBO_TAG));
        let widget = slot.widget.unwrap();
        assert_eq!(widget.kind, WidgetKind::Combo);
        assert_eq!(widget.options, Some(vec![json!("euler"), json!("ddim")]));
    }

    #[test]
    fn widget_kinds_derived_from_tag_and_config() {
        let number: InputSpec = serde_json::from_value(json!(["INT", {"default": 5}])).unwrap();
        assert_eq!(
            input_slot_from_spec("steps", &number).widget.unwrap().kind,
            WidgetKind::Number
        );

        let toggle: InputSpec = serde_json::from_value(json!("BOOLEAN")).unwrap();
        assert_eq!(
            input_slot_from_spec("enabled", &toggle).widget.unwrap().kind,
            WidgetKind::Toggle
        );

        let text: InputSpec = serde_json::from_value(json!("STRING")).unwrap();
        assert_eq!(
            input_slot_from_spec("prefix", &text).widget.unwrap().kind,
            WidgetKind::Text
        );

        let textarea: InputSpec =
            serde_json::from_value(json!(["STRING", {"multiline": true}])).unwrap();
        assert_eq!(
            input_slot_from_spec("prompt", &textarea).widget.unwrap().kind,
            WidgetKind::Textarea
        );

        let wire_only: InputSpec = serde_json::from_value(json!("LATENT")).unwrap();
        assert!(input_slot_from_spec("latent", &wire_only).widget.is_none());
    }

    #[test]
    fn enumerable_values_and_upload_become_combos() {
        let values: InputSpec =
            serde_json::from_value(json!(["STRING", {"values": ["a", "b"]}])).unwrap();
        let slot = input_slot_from_spec("choice", &values);
        assert_eq!(slot.ty.as_tag(), Some("STRING"));
        assert_eq!(slot.widget.unwrap().kind, WidgetKind::Combo);

        let upload: InputSpec =
            serde_json::from_value(json!(["IMAGE", {"image_upload": true}])).unwrap();
        let slot = input_slot_from_spec("image", &upload);
        let widget = slot.widget.unwrap();
        assert_eq!(widget.kind, WidgetKind::Combo);
        assert_eq!(widget.options, Some(Vec::new()));
    }

    #[test]
    fn output_names_fall_back_to_tag() {
        let output = vec![SlotType::tag("IMAGE"), SlotType::tag("MASK")];
        let names = vec!["image_out".to_string()];

        let slots = build_output_slots(&output, &names);
        assert_eq!(slots[0].name, "image_out");
        assert_eq!(slots[1].name, "MASK");
        assert!(slots.iter().all(|slot| slot.links.is_none()));
    }

    #[test]
    fn defaults_use_config_then_type_fallback() {
        let input = section(
            vec![
                ("cfg", json!(["FLOAT", {"default": 8.0}])),
                ("steps", json!("INT")),
                ("text", json!("STRING")),
                ("enabled", json!("BOOLEAN")),
                ("sampler", json!(["euler", "ddim"])),
                ("latent", json!("LATENT")),
            ],
            vec![],
        );
        let order = order(
            vec!["cfg", "steps", "text", "enabled", "sampler", "latent"],
            vec![],
        );

        let values = default_widget_values(&input, &order);
        assert_eq!(
            values,
            vec![json!(8.0), json!(0), json!(""), json!(false), json!("euler")]
        );
    }

    #[test]
    fn seed_widget_gets_fixed_companion() {
        // A node with one integer input named `seed` and no other
        // widget-eligible inputs: exactly [0, "Fixed"].
        let input = section(vec![("seed", json!(["INT", {"default": 0}]))], vec![]);
        let order = order(vec!["seed"], vec![]);

        let values = default_widget_values(&input, &order);
        assert_eq!(values, vec![json!(0), json!("Fixed")]);
    }

    #[test]
    fn noise_seed_also_gets_companion() {
        let input = section(vec![("noise_seed", json!("INT"))], vec![]);
        let values = default_widget_values(&input, &order(vec![], vec![]));
        assert_eq!(values, vec![json!(0), json!("Fixed")]);
    }
}
