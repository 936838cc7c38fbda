//! Valuation wizard: a five-step input state machine.
//!
//! All mutation goes through [`reduce`], one `(state, event) -> state`
//! transition. Cross-field rules (region reset on city change, Location
//! re-validation) live there and nowhere else.
//!
//! Steps can be visited in any order; submission requires every step
//! predicate to hold at once.

use crate::domain::catalog::LocationCatalog;
use crate::domain::entities::{Category, CityId, PropertyInput, Purpose, RegionId};
use crate::domain::errors::{ValidationFailure, ValidationReport};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Floor for room and bathroom counts.
pub const MIN_COUNT: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum WizardStep {
    Purpose = 1,
    Category = 2,
    Location = 3,
    Rooms = 4,
    Size = 5,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::Purpose,
        WizardStep::Category,
        WizardStep::Location,
        WizardStep::Rooms,
        WizardStep::Size,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.number() == n)
    }

    pub fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    pub fn prev(self) -> Option<Self> {
        self.number().checked_sub(1).and_then(Self::from_number)
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::Purpose => "Purpose",
            WizardStep::Category => "Category",
            WizardStep::Location => "Location",
            WizardStep::Rooms => "Rooms",
            WizardStep::Size => "Size",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Purpose,
    Category,
    City,
    Region,
    RoomCount,
    BathroomCount,
    Size,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Purpose => "purpose",
            Field::Category => "category",
            Field::City => "city",
            Field::Region => "region",
            Field::RoomCount => "rooms",
            Field::BathroomCount => "bathrooms",
            Field::Size => "size",
        };
        f.write_str(name)
    }
}

/// Partial property input collected so far.
#[derive(Debug, Clone, PartialEq)]
pub struct Answers {
    pub purpose: Option<Purpose>,
    pub category: Option<Category>,
    pub city_id: Option<CityId>,
    pub region_id: Option<RegionId>,
    pub room_count: u32,
    pub bathroom_count: u32,
    /// Raw size text as typed; parsed by the Size predicate.
    pub size: String,
}

impl Default for Answers {
    fn default() -> Self {
        Self {
            purpose: None,
            category: None,
            city_id: None,
            region_id: None,
            room_count: MIN_COUNT,
            bathroom_count: MIN_COUNT,
            size: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Editing,
    /// Terminal. Holds the finalized input; further edits are ignored until Reset.
    Submitted(PropertyInput),
}

#[derive(Debug, Clone, PartialEq)]
pub enum WizardEvent {
    SetPurpose(Purpose),
    SetCategory(Category),
    SetCity(Option<CityId>),
    SetRegion(Option<RegionId>),
    IncrementRooms,
    DecrementRooms,
    IncrementBathrooms,
    DecrementBathrooms,
    /// Direct entry, floored at [`MIN_COUNT`].
    SetRooms(u32),
    SetBathrooms(u32),
    SetSize(String),
    GoTo(WizardStep),
    Advance(WizardStep),
    /// Advance the current step, then move forward if it passed.
    Next,
    Back,
    Submit,
    Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WizardState {
    pub current_step: WizardStep,
    pub answers: Answers,
    pub completed_steps: BTreeSet<WizardStep>,
    pub validation_errors: BTreeMap<WizardStep, Vec<ValidationFailure>>,
    pub phase: Phase,
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardState {
    pub fn new() -> Self {
        Self {
            current_step: WizardStep::Purpose,
            answers: Answers::default(),
            completed_steps: BTreeSet::new(),
            validation_errors: BTreeMap::new(),
            phase: Phase::Editing,
        }
    }

    pub fn is_submitted(&self) -> bool {
        matches!(self.phase, Phase::Submitted(_))
    }

    pub fn submitted_input(&self) -> Option<&PropertyInput> {
        match &self.phase {
            Phase::Submitted(input) => Some(input),
            Phase::Editing => None,
        }
    }

    pub fn errors_for(&self, step: WizardStep) -> &[ValidationFailure] {
        self.validation_errors
            .get(&step)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Completed steps out of five.
    pub fn progress(&self) -> (usize, usize) {
        (self.completed_steps.len(), WizardStep::ALL.len())
    }

    /// Run a step predicate and record the outcome.
    fn check(&mut self, catalog: &LocationCatalog, step: WizardStep) -> bool {
        let failures = validate_step(catalog, &self.answers, step);
        if failures.is_empty() {
            self.completed_steps.insert(step);
            self.validation_errors.remove(&step);
            true
        } else {
            self.completed_steps.remove(&step);
            self.validation_errors.insert(step, failures);
            false
        }
    }

    /// Re-run a step predicate after a field edit. A step that stops holding
    /// loses its completion. Errors are shown only when `force` is set or the
    /// step was already completed or already showing errors.
    fn revalidate(&mut self, catalog: &LocationCatalog, step: WizardStep, force: bool) {
        let failures = validate_step(catalog, &self.answers, step);
        if failures.is_empty() {
            self.validation_errors.remove(&step);
            return;
        }
        let was_completed = self.completed_steps.remove(&step);
        if force || was_completed || self.validation_errors.contains_key(&step) {
            self.validation_errors.insert(step, failures);
        }
    }

    fn submit(&mut self, catalog: &LocationCatalog) {
        let mut all_valid = true;
        for step in WizardStep::ALL {
            all_valid &= self.check(catalog, step);
        }
        if !all_valid {
            return;
        }
        if let Some(input) = finalize(&self.answers) {
            self.phase = Phase::Submitted(input);
        }
    }
}

/// Predicate for one step. Empty result means the step holds.
pub fn validate_step(
    catalog: &LocationCatalog,
    answers: &Answers,
    step: WizardStep,
) -> Vec<ValidationFailure> {
    let mut failures = Vec::new();
    match step {
        WizardStep::Purpose => {
            if answers.purpose.is_none() {
                failures.push(ValidationFailure::new(
                    step,
                    Field::Purpose,
                    "Please select a purpose",
                ));
            }
        }
        WizardStep::Category => {
            if answers.category.is_none() {
                failures.push(ValidationFailure::new(
                    step,
                    Field::Category,
                    "Please select a category",
                ));
            }
        }
        WizardStep::Location => {
            if answers.city_id.is_none() {
                failures.push(ValidationFailure::new(step, Field::City, "Please select a city"));
            }
            match (answers.city_id, answers.region_id) {
                (_, None) => failures.push(ValidationFailure::new(
                    step,
                    Field::Region,
                    "Please select a region",
                )),
                (Some(city), Some(region)) if !catalog.contains_region(city, region) => {
                    failures.push(ValidationFailure::new(
                        step,
                        Field::Region,
                        "Selected region does not belong to the selected city",
                    ))
                }
                _ => {}
            }
        }
        WizardStep::Rooms => {
            if answers.room_count < MIN_COUNT {
                failures.push(ValidationFailure::new(
                    step,
                    Field::RoomCount,
                    "At least one room is required",
                ));
            }
            if answers.bathroom_count < MIN_COUNT {
                failures.push(ValidationFailure::new(
                    step,
                    Field::BathroomCount,
                    "At least one bathroom is required",
                ));
            }
        }
        WizardStep::Size => {
            if let Err(message) = parse_size(&answers.size) {
                failures.push(ValidationFailure::new(step, Field::Size, message));
            }
        }
    }
    failures
}

/// Size must be a finite number strictly greater than zero.
pub fn parse_size(raw: &str) -> Result<f64, &'static str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("Please enter the size");
    }
    let value: f64 = raw.parse().map_err(|_| "Size must be a number")?;
    if !value.is_finite() {
        return Err("Size must be a number");
    }
    if value <= 0.0 {
        return Err("Size must be greater than 0");
    }
    Ok(value)
}

fn finalize(answers: &Answers) -> Option<PropertyInput> {
    Some(PropertyInput {
        purpose: answers.purpose?,
        category: answers.category?,
        city_id: answers.city_id?,
        region_id: answers.region_id?,
        room_count: answers.room_count,
        bathroom_count: answers.bathroom_count,
        size_sqm: parse_size(&answers.size).ok()?,
    })
}

/// The single transition function for the wizard.
pub fn reduce(catalog: &LocationCatalog, mut state: WizardState, event: WizardEvent) -> WizardState {
    if state.is_submitted() {
        return match event {
            WizardEvent::Reset => WizardState::new(),
            _ => state,
        };
    }

    match event {
        WizardEvent::SetPurpose(purpose) => {
            state.answers.purpose = Some(purpose);
            state.revalidate(catalog, WizardStep::Purpose, false);
        }
        WizardEvent::SetCategory(category) => {
            state.answers.category = Some(category);
            state.revalidate(catalog, WizardStep::Category, false);
        }
        WizardEvent::SetCity(city) => {
            if state.answers.city_id != city {
                state.answers.city_id = city;
                // A region chosen under the old city may not exist under the new one.
                state.answers.region_id = None;
                state.revalidate(catalog, WizardStep::Location, true);
            }
        }
        WizardEvent::SetRegion(region) => {
            if state.answers.region_id != region {
                state.answers.region_id = region;
                state.revalidate(catalog, WizardStep::Location, true);
            }
        }
        WizardEvent::IncrementRooms => {
            state.answers.room_count = state.answers.room_count.saturating_add(1);
            state.revalidate(catalog, WizardStep::Rooms, false);
        }
        WizardEvent::DecrementRooms => {
            state.answers.room_count = state.answers.room_count.saturating_sub(1).max(MIN_COUNT);
            state.revalidate(catalog, WizardStep::Rooms, false);
        }
        WizardEvent::IncrementBathrooms => {
            state.answers.bathroom_count = state.answers.bathroom_count.saturating_add(1);
            state.revalidate(catalog, WizardStep::Rooms, false);
        }
        WizardEvent::DecrementBathrooms => {
            state.answers.bathroom_count =
                state.answers.bathroom_count.saturating_sub(1).max(MIN_COUNT);
            state.revalidate(catalog, WizardStep::Rooms, false);
        }
        WizardEvent::SetRooms(n) => {
            state.answers.room_count = n.max(MIN_COUNT);
            state.revalidate(catalog, WizardStep::Rooms, false);
        }
        WizardEvent::SetBathrooms(n) => {
            state.answers.bathroom_count = n.max(MIN_COUNT);
            state.revalidate(catalog, WizardStep::Rooms, false);
        }
        WizardEvent::SetSize(raw) => {
            state.answers.size = raw;
            state.revalidate(catalog, WizardStep::Size, false);
        }
        WizardEvent::GoTo(step) => state.current_step = step,
        WizardEvent::Advance(step) => {
            state.check(catalog, step);
        }
        WizardEvent::Next => {
            let step = state.current_step;
            if state.check(catalog, step) {
                if let Some(next) = step.next() {
                    state.current_step = next;
                }
            }
        }
        WizardEvent::Back => {
            if let Some(prev) = state.current_step.prev() {
                state.current_step = prev;
            }
        }
        WizardEvent::Submit => state.submit(catalog),
        WizardEvent::Reset => return WizardState::new(),
    }
    state
}

/// Single owner of a wizard session. Wraps [`reduce`] with result-returning
/// `advance`/`submit` for callers that want a `Result`.
pub struct Wizard {
    catalog: Arc<LocationCatalog>,
    state: WizardState,
}

impl Wizard {
    pub fn new(catalog: Arc<LocationCatalog>) -> Self {
        Self {
            catalog,
            state: WizardState::new(),
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn dispatch(&mut self, event: WizardEvent) -> &WizardState {
        let state = std::mem::take(&mut self.state);
        self.state = reduce(&self.catalog, state, event);
        &self.state
    }

    /// Validate one step. Failure is non-fatal; the user keeps editing.
    pub fn advance(&mut self, step: WizardStep) -> Result<(), ValidationReport> {
        self.dispatch(WizardEvent::Advance(step));
        if self.state.completed_steps.contains(&step) {
            Ok(())
        } else {
            Err(ValidationReport::new(self.state.errors_for(step).to_vec()))
        }
    }

    /// Finalize the input if all five steps hold; otherwise report every failing step.
    /// Calling it again after success returns the same input.
    pub fn submit(&mut self) -> Result<PropertyInput, ValidationReport> {
        self.dispatch(WizardEvent::Submit);
        if let Some(input) = self.state.submitted_input() {
            return Ok(input.clone());
        }
        let failures = self
            .state
            .validation_errors
            .values()
            .flatten()
            .cloned()
            .collect();
        Err(ValidationReport::new(failures))
    }

    pub fn reset(&mut self) {
        self.dispatch(WizardEvent::Reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{City, Region};

    fn catalog() -> Arc<LocationCatalog> {
        let regions = |names: &[&str]| {
            names
                .iter()
                .enumerate()
                .map(|(i, n)| Region {
                    id: i as RegionId,
                    name: n.to_string(),
                })
                .collect()
        };
        Arc::new(
            LocationCatalog::new(
                "test",
                vec![
                    City {
                        id: 19,
                        name: "Sousse".into(),
                        regions: regions(&["Akouda", "Enfida"]),
                    },
                    City {
                        id: 22,
                        name: "Tunis".into(),
                        regions: regions(&["Bab El Bhar", "Carthage", "La Marsa"]),
                    },
                ],
            )
            .unwrap(),
        )
    }

    fn filled(wizard: &mut Wizard) {
        wizard.dispatch(WizardEvent::SetPurpose(Purpose::Buy));
        wizard.dispatch(WizardEvent::SetCategory(Category::Apartment));
        wizard.dispatch(WizardEvent::SetCity(Some(22)));
        wizard.dispatch(WizardEvent::SetRegion(Some(2)));
        wizard.dispatch(WizardEvent::IncrementRooms);
        wizard.dispatch(WizardEvent::SetSize("80".into()));
    }

    #[test]
    fn new_state_defaults() {
        let state = WizardState::new();
        assert_eq!(state.current_step, WizardStep::Purpose);
        assert_eq!(state.answers.room_count, 1);
        assert_eq!(state.answers.bathroom_count, 1);
        assert!(state.completed_steps.is_empty());
        assert_eq!(state.progress(), (0, 5));
    }

    #[test]
    fn step_navigation_bounds() {
        assert_eq!(WizardStep::Purpose.prev(), None);
        assert_eq!(WizardStep::Size.next(), None);
        assert_eq!(WizardStep::Location.next(), Some(WizardStep::Rooms));
        assert_eq!(WizardStep::from_number(0), None);
    }

    #[test]
    fn next_is_gated_by_current_step() {
        let mut wizard = Wizard::new(catalog());
        wizard.dispatch(WizardEvent::Next);
        assert_eq!(wizard.state().current_step, WizardStep::Purpose);
        assert_eq!(wizard.state().errors_for(WizardStep::Purpose)[0].field, Field::Purpose);

        wizard.dispatch(WizardEvent::SetPurpose(Purpose::Rent));
        assert!(wizard.state().errors_for(WizardStep::Purpose).is_empty());
        wizard.dispatch(WizardEvent::Next);
        assert_eq!(wizard.state().current_step, WizardStep::Category);
        assert!(wizard.state().completed_steps.contains(&WizardStep::Purpose));

        wizard.dispatch(WizardEvent::Back);
        assert_eq!(wizard.state().current_step, WizardStep::Purpose);
        wizard.dispatch(WizardEvent::Back);
        assert_eq!(wizard.state().current_step, WizardStep::Purpose);
    }

    #[test]
    fn steps_can_be_visited_out_of_order() {
        let mut wizard = Wizard::new(catalog());
        wizard.dispatch(WizardEvent::GoTo(WizardStep::Size));
        wizard.dispatch(WizardEvent::SetSize("120".into()));
        assert!(wizard.advance(WizardStep::Size).is_ok());
        assert!(wizard.advance(WizardStep::Rooms).is_ok());
        assert_eq!(wizard.state().progress(), (2, 5));
    }

    #[test]
    fn changing_city_clears_region_and_reopens_location() {
        let mut wizard = Wizard::new(catalog());
        wizard.dispatch(WizardEvent::SetCity(Some(22)));
        wizard.dispatch(WizardEvent::SetRegion(Some(2)));
        assert!(wizard.advance(WizardStep::Location).is_ok());

        let state = wizard.dispatch(WizardEvent::SetCity(Some(19)));
        assert_eq!(state.answers.region_id, None);
        assert!(!state.completed_steps.contains(&WizardStep::Location));
        let errors = state.errors_for(WizardStep::Location);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, Field::Region);

        wizard.dispatch(WizardEvent::SetRegion(Some(1)));
        assert!(wizard.state().errors_for(WizardStep::Location).is_empty());
        assert!(wizard.advance(WizardStep::Location).is_ok());
    }

    #[test]
    fn reselecting_same_city_keeps_region() {
        let mut wizard = Wizard::new(catalog());
        wizard.dispatch(WizardEvent::SetCity(Some(22)));
        wizard.dispatch(WizardEvent::SetRegion(Some(1)));
        wizard.dispatch(WizardEvent::SetCity(Some(22)));
        assert_eq!(wizard.state().answers.region_id, Some(1));
    }

    #[test]
    fn clearing_city_invalidates_location() {
        let mut wizard = Wizard::new(catalog());
        wizard.dispatch(WizardEvent::SetCity(Some(22)));
        wizard.dispatch(WizardEvent::SetRegion(Some(0)));
        wizard.dispatch(WizardEvent::SetCity(None));
        let fields: Vec<Field> = wizard
            .state()
            .errors_for(WizardStep::Location)
            .iter()
            .map(|f| f.field)
            .collect();
        assert_eq!(fields, vec![Field::City, Field::Region]);
    }

    #[test]
    fn region_outside_city_fails_location() {
        let mut wizard = Wizard::new(catalog());
        wizard.dispatch(WizardEvent::SetCity(Some(19)));
        wizard.dispatch(WizardEvent::SetRegion(Some(2)));
        let report = wizard.advance(WizardStep::Location).unwrap_err();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].field, Field::Region);
    }

    #[test]
    fn counts_have_floor_of_one() {
        let mut wizard = Wizard::new(catalog());
        wizard.dispatch(WizardEvent::DecrementRooms);
        wizard.dispatch(WizardEvent::DecrementBathrooms);
        assert_eq!(wizard.state().answers.room_count, 1);
        assert_eq!(wizard.state().answers.bathroom_count, 1);
        wizard.dispatch(WizardEvent::IncrementBathrooms);
        wizard.dispatch(WizardEvent::IncrementBathrooms);
        wizard.dispatch(WizardEvent::DecrementBathrooms);
        assert_eq!(wizard.state().answers.bathroom_count, 2);
        wizard.dispatch(WizardEvent::SetRooms(0));
        assert_eq!(wizard.state().answers.room_count, 1);
        assert!(wizard.advance(WizardStep::Rooms).is_ok());
    }

    #[test]
    fn size_must_be_positive_number() {
        assert_eq!(parse_size(""), Err("Please enter the size"));
        assert_eq!(parse_size("abc"), Err("Size must be a number"));
        assert_eq!(parse_size("NaN"), Err("Size must be a number"));
        assert_eq!(parse_size("0"), Err("Size must be greater than 0"));
        assert_eq!(parse_size("-3"), Err("Size must be greater than 0"));
        assert_eq!(parse_size(" 80.5 "), Ok(80.5));
    }

    #[test]
    fn submit_lists_every_failing_step() {
        let mut wizard = Wizard::new(catalog());
        let report = wizard.submit().unwrap_err();
        let steps: Vec<WizardStep> = report.steps().into_iter().collect();
        assert_eq!(
            steps,
            vec![
                WizardStep::Purpose,
                WizardStep::Category,
                WizardStep::Location,
                WizardStep::Size
            ]
        );
        assert!(!wizard.state().is_submitted());
        assert!(wizard.state().completed_steps.contains(&WizardStep::Rooms));
    }

    #[test]
    fn submit_with_zero_size_fails_on_size_only() {
        let mut wizard = Wizard::new(catalog());
        filled(&mut wizard);
        wizard.dispatch(WizardEvent::SetSize("0".into()));
        let report = wizard.submit().unwrap_err();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].step, WizardStep::Size);
        assert_eq!(report.failures[0].field, Field::Size);
        assert!(wizard.state().submitted_input().is_none());
    }

    #[test]
    fn submit_finalizes_and_is_idempotent() {
        let mut wizard = Wizard::new(catalog());
        filled(&mut wizard);
        let input = wizard.submit().unwrap();
        assert_eq!(
            input,
            PropertyInput {
                purpose: Purpose::Buy,
                category: Category::Apartment,
                city_id: 22,
                region_id: 2,
                room_count: 2,
                bathroom_count: 1,
                size_sqm: 80.0,
            }
        );
        assert_eq!(wizard.state().progress(), (5, 5));

        // Finalized state ignores edits and re-submits to the same input.
        wizard.dispatch(WizardEvent::SetSize("999".into()));
        assert_eq!(wizard.submit().unwrap(), input);

        wizard.reset();
        assert_eq!(wizard.state(), &WizardState::new());
    }

    #[test]
    fn edit_after_completion_reopens_step() {
        let mut wizard = Wizard::new(catalog());
        wizard.dispatch(WizardEvent::SetSize("50".into()));
        assert!(wizard.advance(WizardStep::Size).is_ok());
        wizard.dispatch(WizardEvent::SetSize("fifty".into()));
        assert!(!wizard.state().completed_steps.contains(&WizardStep::Size));
        assert_eq!(
            wizard.state().errors_for(WizardStep::Size)[0].message,
            "Size must be a number"
        );
    }

    #[test]
    fn untouched_step_edit_does_not_show_errors() {
        let mut wizard = Wizard::new(catalog());
        wizard.dispatch(WizardEvent::SetSize("x".into()));
        assert!(wizard.state().errors_for(WizardStep::Size).is_empty());
    }
}
