#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic scenario model that transitions the coupled physical state.
//!
//! A run is a stateful transition: effects combine with whatever the previous
//! runs left behind according to the per-field [`UpdateMode`] selected by the
//! [`TransitionRules`]. Inputs are validated before anything is touched.

pub mod catalog;
pub mod rules;

use neural_terra_core::{
    ImpactLevel, PhysicalState, ScenarioInput, ScenarioKind, ValidationError,
    BASELINE_ENERGY_DEMAND, BASELINE_SHIPPING_DELAY, BASELINE_TEMPERATURE,
};

pub use catalog::{PresetCatalog, PresetCatalogError, ScenarioPreset};
pub use rules::{FieldModes, TransitionRules, TransitionRulesError, UpdateMode};

/// Observable consequences of a single scenario application.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Transition {
    /// Alerts appended by the transition, in insertion order.
    pub alerts_added: Vec<String>,
    /// Previous and new level when the impact level escalated.
    pub level_change: Option<(ImpactLevel, ImpactLevel)>,
}

#[derive(Debug)]
struct Effects {
    temperature: f64,
    energy_demand: f64,
    shipping_delay: f64,
    level: Option<ImpactLevel>,
    alert: Option<String>,
}

impl Effects {
    fn for_input(input: &ScenarioInput) -> Self {
        let m = input.magnitude;
        let region = &input.region;
        match input.kind {
            ScenarioKind::Heatwave => {
                let temp_increase = m * 8.0;
                let level = if temp_increase > 6.0 {
                    Some(ImpactLevel::Critical)
                } else if temp_increase > 4.0 {
                    Some(ImpactLevel::High)
                } else if temp_increase > 2.0 {
                    Some(ImpactLevel::Medium)
                } else {
                    None
                };
                Self {
                    temperature: temp_increase,
                    energy_demand: temp_increase * 0.12,
                    shipping_delay: (temp_increase * 2.5).min(25.0),
                    level,
                    alert: (temp_increase > 3.0)
                        .then(|| format!("{region}: +{:.1}°C Heatwave", tenths(temp_increase))),
                }
            }
            ScenarioKind::CanalClosure => {
                let severe = m > 0.7;
                Self {
                    temperature: m * 0.3,
                    energy_demand: m * 0.15,
                    shipping_delay: m * 40.0,
                    level: severe.then_some(ImpactLevel::High),
                    alert: severe.then(|| format!("{region}: Major Shipping Disruption")),
                }
            }
            ScenarioKind::Storm => {
                let severe = m > 0.8;
                Self {
                    temperature: -m * 2.0,
                    energy_demand: m * 0.25,
                    shipping_delay: m * 30.0,
                    level: severe.then_some(ImpactLevel::Critical),
                    alert: severe.then(|| format!("{region}: Severe Storm Warning")),
                }
            }
            ScenarioKind::Drought => {
                let severe = m > 0.6;
                Self {
                    temperature: m * 1.5,
                    energy_demand: m * 0.2,
                    shipping_delay: m * 15.0,
                    level: severe.then_some(ImpactLevel::High),
                    alert: severe.then(|| format!("{region}: Severe Drought Alert")),
                }
            }
        }
    }
}

/// Applies `input` to `state` in place.
///
/// Invalid input is rejected before any field changes. The impact level only
/// ever rises and alerts are only ever appended.
pub fn apply(
    state: &mut PhysicalState,
    input: &ScenarioInput,
    rules: &TransitionRules,
) -> Result<Transition, ValidationError> {
    input.validate()?;

    let effects = Effects::for_input(input);
    let modes = rules.modes(input.kind);

    state.set_temperature(modes.temperature.combine(
        state.temperature(),
        BASELINE_TEMPERATURE,
        effects.temperature,
    ));
    state.set_energy_demand(modes.energy_demand.combine(
        state.energy_demand(),
        BASELINE_ENERGY_DEMAND,
        effects.energy_demand,
    ));
    state.set_shipping_delay(modes.shipping_delay.combine(
        state.shipping_delay(),
        BASELINE_SHIPPING_DELAY,
        effects.shipping_delay,
    ));

    let mut transition = Transition::default();
    if let Some(level) = effects.level {
        let from = state.impact_level();
        if state.raise_impact_level(level) {
            transition.level_change = Some((from, level));
        }
    }
    if let Some(alert) = effects.alert {
        state.push_alert(alert.clone());
        transition.alerts_added.push(alert);
    }

    tracing::debug!(
        target: "neural_terra::scenario",
        kind = %input.kind,
        region = %input.region,
        magnitude = input.magnitude,
        temperature = state.temperature(),
        energy_demand = state.energy_demand(),
        shipping_delay = state.shipping_delay(),
        impact_level = %state.impact_level(),
        "scenario.applied"
    );

    Ok(transition)
}

/// Rounds to one decimal with ties away from zero, so `3.25` reads `3.3`.
fn tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Restores the baseline state and clears every alert.
pub fn reset(state: &mut PhysicalState) {
    state.reset();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    fn run(state: &mut PhysicalState, kind: ScenarioKind, region: &str, m: f64) -> Transition {
        let input = ScenarioInput::new(kind, region, m, 24);
        apply(state, &input, &TransitionRules::builtin()).expect("valid input")
    }

    #[test]
    fn heatwave_formats_alert_with_one_decimal() {
        let mut state = PhysicalState::baseline();
        let transition = run(&mut state, ScenarioKind::Heatwave, "europe", 0.6);

        assert_close(state.temperature(), 19.8);
        assert_close(state.energy_demand(), 1.576);
        assert_close(state.shipping_delay(), 12.0);
        assert_eq!(state.alerts(), ["europe: +4.8°C Heatwave"]);
        assert_eq!(state.impact_level(), ImpactLevel::High);
        assert_eq!(
            transition.level_change,
            Some((ImpactLevel::Low, ImpactLevel::High))
        );
    }

    #[test]
    fn heatwave_alert_rounds_ties_up() {
        let mut state = PhysicalState::baseline();
        let _ = run(&mut state, ScenarioKind::Heatwave, "x", 0.40625);
        assert_eq!(state.alerts(), ["x: +3.3°C Heatwave"]);
    }

    #[test]
    fn heatwave_caps_shipping_delay_at_twenty_five() {
        let mut state = PhysicalState::baseline();
        let _ = run(&mut state, ScenarioKind::Heatwave, "sahara", 1.0);
        assert_close(state.shipping_delay(), 20.0);
        assert_eq!(state.impact_level(), ImpactLevel::Critical);
    }

    #[test]
    fn heatwave_energy_never_drops_below_prior_demand() {
        let mut state = PhysicalState::baseline();
        let _ = run(&mut state, ScenarioKind::Storm, "atlantic", 1.0);
        assert_close(state.energy_demand(), 1.25);

        let _ = run(&mut state, ScenarioKind::Heatwave, "europe", 0.1);
        assert_close(state.energy_demand(), 1.25);
    }

    #[test]
    fn mild_heatwave_leaves_level_and_alerts_alone() {
        let mut state = PhysicalState::baseline();
        let transition = run(&mut state, ScenarioKind::Heatwave, "europe", 0.25);
        assert!(state.alerts().is_empty());
        assert_eq!(state.impact_level(), ImpactLevel::Low);
        assert_eq!(transition, Transition::default());
    }

    #[test]
    fn canal_closure_matches_reference_values() {
        let mut state = PhysicalState::baseline();
        let input = ScenarioInput::new(ScenarioKind::CanalClosure, "suez_canal", 0.4, 168);
        let transition =
            apply(&mut state, &input, &TransitionRules::builtin()).expect("valid input");

        assert_close(state.shipping_delay(), 16.0);
        assert_close(state.energy_demand(), 1.06);
        assert_close(state.temperature(), 15.12);
        assert_eq!(state.impact_level(), ImpactLevel::Low);
        assert!(state.alerts().is_empty());
        assert!(transition.alerts_added.is_empty());
    }

    #[test]
    fn severe_canal_closure_raises_alert() {
        let mut state = PhysicalState::baseline();
        let _ = run(&mut state, ScenarioKind::CanalClosure, "panama_canal", 0.8);
        assert_eq!(state.alerts(), ["panama_canal: Major Shipping Disruption"]);
        assert_eq!(state.impact_level(), ImpactLevel::High);
    }

    #[test]
    fn severe_storm_is_critical() {
        let mut state = PhysicalState::baseline();
        let _ = run(&mut state, ScenarioKind::Storm, "atlantic", 0.9);
        assert_eq!(state.impact_level(), ImpactLevel::Critical);
        assert_eq!(state.alerts(), ["atlantic: Severe Storm Warning"]);
        assert_close(state.temperature(), 13.2);
    }

    #[test]
    fn storms_may_push_temperature_below_zero() {
        let mut state = PhysicalState::baseline();
        for _ in 0..10 {
            let _ = run(&mut state, ScenarioKind::Storm, "arctic", 1.0);
        }
        assert_close(state.temperature(), -5.0);
        assert_eq!(state.alerts().len(), 10);
    }

    #[test]
    fn severe_drought_is_high() {
        let mut state = PhysicalState::baseline();
        let _ = run(&mut state, ScenarioKind::Drought, "sahel", 0.7);
        assert_eq!(state.impact_level(), ImpactLevel::High);
        assert_eq!(state.alerts(), ["sahel: Severe Drought Alert"]);
        assert_close(state.energy_demand(), 1.14);
        assert_close(state.shipping_delay(), 10.5);
    }

    #[test]
    fn impact_level_never_decreases_without_reset() {
        let mut state = PhysicalState::baseline();
        let _ = run(&mut state, ScenarioKind::Storm, "atlantic", 0.9);
        let transition = run(&mut state, ScenarioKind::Drought, "sahel", 0.9);
        assert_eq!(state.impact_level(), ImpactLevel::Critical);
        assert_eq!(transition.level_change, None);

        reset(&mut state);
        assert_eq!(state, PhysicalState::baseline());
    }

    #[test]
    fn rejected_input_leaves_state_untouched() {
        let mut state = PhysicalState::baseline();
        let _ = run(&mut state, ScenarioKind::Drought, "sahel", 0.7);
        let before = state.clone();

        let input = ScenarioInput::new(ScenarioKind::Storm, "atlantic", -0.1, 24);
        let error = apply(&mut state, &input, &TransitionRules::builtin()).unwrap_err();
        assert_eq!(error.field(), "magnitude");
        assert_eq!(state, before);

        let input = ScenarioInput::new(ScenarioKind::Storm, "atlantic", 0.5, 0);
        assert!(apply(&mut state, &input, &TransitionRules::builtin()).is_err());
        assert_eq!(state, before);
    }

    #[test]
    fn accumulate_mode_compounds_shipping_delay_within_bounds() {
        let mut rules = TransitionRules::builtin();
        let mut modes = rules.modes(ScenarioKind::CanalClosure);
        modes.shipping_delay = UpdateMode::Accumulate;
        rules.set_modes(ScenarioKind::CanalClosure, modes);

        let mut state = PhysicalState::baseline();
        let input = ScenarioInput::new(ScenarioKind::CanalClosure, "suez_canal", 1.0, 24);
        for _ in 0..4 {
            let _ = apply(&mut state, &input, &rules).expect("valid input");
        }
        assert_close(state.shipping_delay(), 100.0);
    }
}
