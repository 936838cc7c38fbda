//! Implements InputPort. Inquire-based interactive prompts.
//!
//! Prompts translate answers into wizard events; the wizard decides what is
//! valid. Only a finalized `PropertyInput` reaches the engine.

use crate::adapters::ui::progress::spinner;
use crate::domain::{
    Category, DomainError, LocationCatalog, PropertyInput, Purpose, ValuationResult, Wizard,
    WizardEvent, WizardState, WizardStep, format_amount,
};
use crate::ports::InputPort;
use crate::usecases::{BatchService, ValuationEngine};
use async_trait::async_trait;
use crossterm::style::Stylize;
use inquire::ui::{Color, RenderConfig, StyleSheet, Styled};
use inquire::{Confirm, CustomType, InquireError, Select, Text};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Applies the prompt theme globally.
pub fn apply_theme() {
    let mut cfg = RenderConfig::default();
    cfg.prompt_prefix = Styled::new("?").with_fg(Color::LightCyan);
    cfg.answered_prompt_prefix = Styled::new("✔").with_fg(Color::LightGreen);
    cfg.highlighted_option_prefix = Styled::new("➤").with_fg(Color::LightYellow);
    cfg.help_message = StyleSheet::new().with_fg(Color::DarkGrey);
    inquire::set_global_render_config(cfg);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    NewValuation,
    Batch,
    Diagnostics,
    Exit,
}

impl MenuAction {
    const ALL: [MenuAction; 4] = [
        MenuAction::NewValuation,
        MenuAction::Batch,
        MenuAction::Diagnostics,
        MenuAction::Exit,
    ];
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MenuAction::NewValuation => "Estimate a property",
            MenuAction::Batch => "Batch valuation from CSV",
            MenuAction::Diagnostics => "Model diagnostics",
            MenuAction::Exit => "Exit",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Review {
    Submit,
    Edit,
    Cancel,
}

impl fmt::Display for Review {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Review::Submit => "Get my estimate",
            Review::Edit => "Edit a previous step",
            Review::Cancel => "Cancel",
        };
        f.write_str(label)
    }
}

/// Esc maps to `None`; Ctrl-C and terminal failures are errors.
fn answer<T>(result: Result<T, InquireError>) -> Result<Option<T>, DomainError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled) => Ok(None),
        Err(InquireError::OperationInterrupted) => Err(DomainError::Ui("interrupted".into())),
        Err(e) => Err(DomainError::Ui(e.to_string())),
    }
}

/// `Step 3/5 · Location  [✔ ✔ ✔ · ·]`
fn progress_line(state: &WizardState) -> String {
    let marks: Vec<&str> = WizardStep::ALL
        .iter()
        .map(|s| {
            if state.completed_steps.contains(s) {
                "✔"
            } else {
                "·"
            }
        })
        .collect();
    format!(
        "Step {}/{} · {}  [{}]",
        state.current_step.number(),
        WizardStep::ALL.len(),
        state.current_step,
        marks.join(" ")
    )
}

fn print_step_errors(state: &WizardState, step: WizardStep) {
    for failure in state.errors_for(step) {
        println!("  {}", format!("✗ {}", failure.message).red());
    }
}

fn print_error(e: &DomainError) {
    println!("{}", format!("✗ {}", e).red().bold());
}

/// Sample properties used by the diagnostics action.
fn diagnostic_samples() -> Vec<(&'static str, PropertyInput)> {
    vec![
        (
            "2-room, 1-bath apartment, 80 m² in Tunis (La Marsa)",
            PropertyInput {
                purpose: Purpose::Buy,
                category: Category::Apartment,
                city_id: 22,
                region_id: 14,
                room_count: 2,
                bathroom_count: 1,
                size_sqm: 80.0,
            },
        ),
        (
            "5-room, 3-bath villa, 250 m² in Sousse (Hammam Sousse)",
            PropertyInput {
                purpose: Purpose::Buy,
                category: Category::HouseVilla,
                city_id: 19,
                region_id: 3,
                room_count: 5,
                bathroom_count: 3,
                size_sqm: 250.0,
            },
        ),
    ]
}

/// TUI adapter. Inquire prompts.
pub struct TuiInputPort {
    catalog: Arc<LocationCatalog>,
    engine: Arc<ValuationEngine>,
    batch: Arc<BatchService>,
    currency: String,
    diagnostics_runs: usize,
}

impl TuiInputPort {
    pub fn new(
        catalog: Arc<LocationCatalog>,
        engine: Arc<ValuationEngine>,
        batch: Arc<BatchService>,
        currency: String,
        diagnostics_runs: usize,
    ) -> Self {
        Self {
            catalog,
            engine,
            batch,
            currency,
            diagnostics_runs,
        }
    }

    async fn run_valuation(&self) -> Result<(), DomainError> {
        let mut wizard = Wizard::new(Arc::clone(&self.catalog));
        loop {
            let step = wizard.state().current_step;
            println!();
            println!("{}", progress_line(wizard.state()).cyan());

            let answered = match step {
                WizardStep::Purpose => self.ask_purpose(&mut wizard)?,
                WizardStep::Category => self.ask_category(&mut wizard)?,
                WizardStep::Location => self.ask_location(&mut wizard)?,
                WizardStep::Rooms => self.ask_rooms(&mut wizard)?,
                WizardStep::Size => self.ask_size(&mut wizard)?,
            };
            if answered.is_none() {
                if step == WizardStep::Purpose {
                    return Ok(());
                }
                wizard.dispatch(WizardEvent::Back);
                continue;
            }

            wizard.dispatch(WizardEvent::Next);
            if !wizard.state().completed_steps.contains(&step) {
                print_step_errors(wizard.state(), step);
                continue;
            }
            if step != WizardStep::Size {
                continue;
            }

            let choice = answer(
                Select::new("Ready?", vec![Review::Submit, Review::Edit, Review::Cancel]).prompt(),
            )?;
            match choice {
                Some(Review::Submit) => match wizard.submit() {
                    Ok(input) => {
                        if !self.estimate(&input).await? {
                            return Ok(());
                        }
                        let again = answer(
                            Confirm::new("Start another valuation?")
                                .with_default(false)
                                .prompt(),
                        )?;
                        if again != Some(true) {
                            return Ok(());
                        }
                        wizard.reset();
                    }
                    Err(report) => {
                        for failure in &report.failures {
                            println!("  {}", format!("✗ {}", failure).red());
                        }
                        if let Some(first) = report.first_step() {
                            wizard.dispatch(WizardEvent::GoTo(first));
                        }
                    }
                },
                Some(Review::Edit) => {
                    let target = answer(
                        Select::new("Which step?", WizardStep::ALL.to_vec())
                            .with_starting_cursor(0)
                            .prompt(),
                    )?;
                    if let Some(target) = target {
                        wizard.dispatch(WizardEvent::GoTo(target));
                    }
                }
                Some(Review::Cancel) | None => return Ok(()),
            }
        }
    }

    fn ask_purpose(&self, wizard: &mut Wizard) -> Result<Option<()>, DomainError> {
        let cursor = wizard
            .state()
            .answers
            .purpose
            .and_then(|p| Purpose::ALL.iter().position(|x| *x == p))
            .unwrap_or(0);
        let picked = answer(
            Select::new("What's your purpose?", Purpose::ALL.to_vec())
                .with_starting_cursor(cursor)
                .prompt(),
        )?;
        Ok(picked.map(|p| {
            wizard.dispatch(WizardEvent::SetPurpose(p));
        }))
    }

    fn ask_category(&self, wizard: &mut Wizard) -> Result<Option<()>, DomainError> {
        let cursor = wizard
            .state()
            .answers
            .category
            .map(|c| c.code() as usize)
            .unwrap_or(0);
        let picked = answer(
            Select::new("Select property category", Category::ALL.to_vec())
                .with_starting_cursor(cursor)
                .prompt(),
        )?;
        Ok(picked.map(|c| {
            wizard.dispatch(WizardEvent::SetCategory(c));
        }))
    }

    fn ask_location(&self, wizard: &mut Wizard) -> Result<Option<()>, DomainError> {
        let city = loop {
            let Some(query) = answer(
                Text::new("Search for a city:")
                    .with_help_message("Leave empty to list all governorates")
                    .prompt(),
            )?
            else {
                return Ok(None);
            };
            let cities = self.catalog.search_cities(&query);
            if cities.is_empty() {
                println!("  {}", "No cities found".yellow());
                continue;
            }
            match answer(Select::new("City:", cities).prompt())? {
                Some(city) => break city,
                None => continue,
            }
        };
        wizard.dispatch(WizardEvent::SetCity(Some(city.id)));

        loop {
            let Some(query) = answer(
                Text::new(&format!("Search for a region in {}:", city.name))
                    .with_help_message("Leave empty to list all regions")
                    .prompt(),
            )?
            else {
                return Ok(Some(()));
            };
            let regions = self.catalog.search_regions(city.id, &query);
            if regions.is_empty() {
                println!("  {}", "No regions found".yellow());
                continue;
            }
            if let Some(region) = answer(Select::new("Region:", regions).prompt())? {
                wizard.dispatch(WizardEvent::SetRegion(Some(region.id)));
                return Ok(Some(()));
            }
        }
    }

    fn ask_rooms(&self, wizard: &mut Wizard) -> Result<Option<()>, DomainError> {
        let answers = &wizard.state().answers;
        let (rooms_now, baths_now) = (answers.room_count, answers.bathroom_count);

        let Some(rooms) = answer(
            CustomType::<u32>::new("Rooms:")
                .with_default(rooms_now)
                .with_help_message("Minimum 1")
                .with_error_message("Please type a whole number")
                .prompt(),
        )?
        else {
            return Ok(None);
        };
        wizard.dispatch(WizardEvent::SetRooms(rooms));

        let Some(baths) = answer(
            CustomType::<u32>::new("Bathrooms:")
                .with_default(baths_now)
                .with_help_message("Minimum 1")
                .with_error_message("Please type a whole number")
                .prompt(),
        )?
        else {
            return Ok(None);
        };
        wizard.dispatch(WizardEvent::SetBathrooms(baths));
        Ok(Some(()))
    }

    fn ask_size(&self, wizard: &mut Wizard) -> Result<Option<()>, DomainError> {
        let current = wizard.state().answers.size.clone();
        let typed = answer(
            Text::new("Size (m²):")
                .with_initial_value(&current)
                .prompt(),
        )?;
        Ok(typed.map(|raw| {
            wizard.dispatch(WizardEvent::SetSize(raw));
        }))
    }

    /// Value a finalized input. On failure offers a retry; returns false if the user gives up.
    async fn estimate(&self, input: &PropertyInput) -> Result<bool, DomainError> {
        loop {
            let pb = (!self.engine.is_initialized())
                .then(|| spinner("Loading valuation model (first run can take a while)..."));
            let outcome = self.engine.valuate(input).await;
            if let Some(pb) = pb {
                pb.finish_and_clear();
            }

            match outcome {
                Ok(result) => {
                    self.print_result(&result);
                    return Ok(true);
                }
                Err(e) => {
                    print_error(&e);
                    let retry = answer(Confirm::new("Try again?").with_default(true).prompt())?;
                    if retry != Some(true) {
                        return Ok(false);
                    }
                }
            }
        }
    }

    fn print_result(&self, result: &ValuationResult) {
        let cur = &self.currency;
        println!();
        println!("{}", "Estimated price".bold());
        println!(
            "  {} {}",
            format_amount(result.point_estimate).bold().green(),
            cur
        );
        println!(
            "  Range: {} to {} {}",
            format_amount(result.low),
            format_amount(result.high),
            cur
        );
        println!(
            "  Per m²: {} {}/m²",
            format_amount(result.price_per_sqm),
            cur
        );
        println!(
            "{}",
            "  The range is a fixed ±10% band for what the model cannot see \
             (condition, exact location, renovation). It is not a statistical \
             confidence interval."
                .dim()
        );
    }

    async fn run_batch(&self) -> Result<(), DomainError> {
        let Some(path) = answer(
            Text::new("CSV file to value:")
                .with_help_message("Columns: purpose,category,city,region,rooms,bathrooms,size")
                .prompt(),
        )?
        else {
            return Ok(());
        };

        let pb = spinner("Valuing properties...");
        let outcome = self.batch.run_file(Path::new(path.trim())).await;
        pb.finish_and_clear();

        let summary = outcome?;
        println!(
            "{} valued, {} failed. Results: {}",
            summary.valued.to_string().green(),
            summary.failed.to_string().red(),
            summary.output_path.display()
        );
        Ok(())
    }

    async fn run_diagnostics(&self) -> Result<(), DomainError> {
        let pb = (!self.engine.is_initialized()).then(|| spinner("Loading valuation model..."));
        let loaded = self.engine.initialize().await;
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        loaded?;
        println!("{}", "✔ Model loaded".green());

        let samples = diagnostic_samples();
        for (label, input) in &samples {
            let result = self.engine.valuate(input).await?;
            println!(
                "  {}: {} {}",
                label,
                format_amount(result.point_estimate),
                self.currency
            );
        }

        let (_, reference) = &samples[0];
        let report = self
            .engine
            .benchmark(reference, self.diagnostics_runs)
            .await?;
        info!(
            runs = report.runs,
            avg_ms = report.average.as_secs_f64() * 1000.0,
            deterministic = report.deterministic,
            "diagnostics complete"
        );
        println!(
            "  {} runs: {:.2} ms average, {:.0} predictions/s, deterministic: {}",
            report.runs,
            report.average.as_secs_f64() * 1000.0,
            report.predictions_per_sec(),
            if report.deterministic { "yes" } else { "NO" }
        );
        Ok(())
    }
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        loop {
            println!();
            let Some(action) = answer(
                Select::new("What would you like to do?", MenuAction::ALL.to_vec()).prompt(),
            )?
            else {
                return Ok(());
            };

            let outcome = match action {
                MenuAction::NewValuation => self.run_valuation().await,
                MenuAction::Batch => self.run_batch().await,
                MenuAction::Diagnostics => self.run_diagnostics().await,
                MenuAction::Exit => return Ok(()),
            };
            match outcome {
                Ok(()) => {}
                Err(e @ DomainError::Ui(_)) => return Err(e),
                Err(e) => print_error(&e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::catalog::load_embedded;

    #[test]
    fn diagnostic_samples_are_valid_locations() {
        let catalog = load_embedded().unwrap();
        for (_, input) in diagnostic_samples() {
            assert!(catalog.contains_region(input.city_id, input.region_id));
        }
        assert_eq!(catalog.region(22, 14).unwrap().name, "La Marsa");
        assert_eq!(catalog.region(19, 3).unwrap().name, "Hammam Sousse");
    }

    #[test]
    fn progress_line_marks_completed_steps() {
        let catalog = Arc::new(load_embedded().unwrap());
        let mut wizard = Wizard::new(catalog);
        wizard.dispatch(WizardEvent::SetPurpose(Purpose::Rent));
        wizard.dispatch(WizardEvent::Next);
        assert_eq!(
            progress_line(wizard.state()),
            "Step 2/5 · Category  [✔ · · · ·]"
        );
    }

    #[test]
    fn cancel_maps_to_none() {
        let r: Result<Option<u32>, _> = answer(Err(InquireError::OperationCanceled));
        assert!(matches!(r, Ok(None)));
        let r: Result<Option<u32>, _> = answer(Err(InquireError::OperationInterrupted));
        assert!(matches!(r, Err(DomainError::Ui(_))));
    }
}
