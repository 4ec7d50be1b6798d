use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use helpdesk_db::{Database, Department, Location, StoreError};
use helpdesk_logging::{LogEvent, Logger, TranscriptWriter};

use crate::context::{Action, FlowContext};
use crate::error::FlowError;
use crate::host::{HostError, PromptHost};
use crate::outcome::FlowOutcome;

/// A state in the intake flow. Each state issues one prompt and captures
/// one answer; `Terminal` accepts no further input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStep {
    ChooseAction,
    ChooseDepartment,
    ChooseSection,
    ChooseLocation,
    EnterDetails,
    Confirm,
    Terminal,
}

impl FlowStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowStep::ChooseAction => "choose_action",
            FlowStep::ChooseDepartment => "choose_department",
            FlowStep::ChooseSection => "choose_section",
            FlowStep::ChooseLocation => "choose_location",
            FlowStep::EnterDetails => "enter_details",
            FlowStep::Confirm => "confirm",
            FlowStep::Terminal => "terminal",
        }
    }
}

impl fmt::Display for FlowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a single step produced.
enum StepOutcome {
    /// Advance to the given step.
    Next(FlowStep),
    /// The flow reached `Terminal` with this outcome.
    End(FlowOutcome),
}

/// Drives one session through the intake steps
pub struct FlowRunner<'a> {
    host: &'a dyn PromptHost,
    db: &'a Database,
    logger: Arc<Logger>,
    transcript: Option<TranscriptWriter>,
}

impl<'a> FlowRunner<'a> {
    pub fn new(host: &'a dyn PromptHost, db: &'a Database, logger: Arc<Logger>) -> Self {
        Self {
            host,
            db,
            logger,
            transcript: None,
        }
    }

    /// Record each accepted answer to a session transcript.
    pub fn with_transcript(mut self, transcript: TranscriptWriter) -> Self {
        self.transcript = Some(transcript);
        self
    }

    /// Run the flow until the session reaches `Terminal` or is abandoned.
    pub async fn run(&self, mut context: FlowContext) -> Result<FlowOutcome, FlowError> {
        self.logger.log(&LogEvent::SessionStarted {
            session_id: context.session_id.to_string(),
        });
        if let Some(ref transcript) = self.transcript {
            transcript.write_start(&context.session_id.to_string());
        }

        let mut step = FlowStep::ChooseAction;
        let outcome = loop {
            self.logger.log(&LogEvent::StepEntered {
                step: step.to_string(),
            });
            debug!(step = %step, "running step");

            let result = match step {
                FlowStep::ChooseAction => self.choose_action(&mut context).await,
                FlowStep::ChooseDepartment => self.choose_department(&mut context).await,
                FlowStep::ChooseSection => self.choose_section(&mut context).await,
                FlowStep::ChooseLocation => self.choose_location(&mut context).await,
                FlowStep::EnterDetails => self.enter_details(&mut context).await,
                FlowStep::Confirm => self.confirm_record(&mut context).await,
                // Finishing steps break out of the loop below; Terminal is
                // never dispatched as a step of its own.
                FlowStep::Terminal => unreachable!("terminal state dispatched as a step"),
            };

            match result {
                Ok(StepOutcome::Next(next)) => step = next,
                Ok(StepOutcome::End(outcome)) => {
                    self.logger.log(&LogEvent::StepEntered {
                        step: FlowStep::Terminal.to_string(),
                    });
                    break outcome;
                }
                Err(FlowError::Host(HostError::Closed)) => {
                    debug!(step = %step, "session closed before terminal");
                    break FlowOutcome::abandoned(step, context.total_duration());
                }
                Err(e) => return Err(e),
            }
        };

        self.logger.log(&LogEvent::SessionEnded {
            outcome: outcome.status().to_string(),
            duration_secs: outcome.duration_secs(),
        });
        if let Some(ref transcript) = self.transcript {
            transcript.write_end(outcome.status(), outcome.duration_secs());
        }

        Ok(outcome)
    }

    async fn choose_action(&self, context: &mut FlowContext) -> Result<StepOutcome, FlowError> {
        let action = self
            .choose(
                FlowStep::ChooseAction,
                "Are you looking to save info or find?",
                &Action::ALL,
            )
            .await?;
        context.action = Some(action);
        Ok(StepOutcome::Next(FlowStep::ChooseDepartment))
    }

    async fn choose_department(
        &self,
        context: &mut FlowContext,
    ) -> Result<StepOutcome, FlowError> {
        let department = self
            .choose(
                FlowStep::ChooseDepartment,
                "Select a department for the data",
                &Department::ALL,
            )
            .await?;
        context.department = Some(department);
        Ok(StepOutcome::Next(FlowStep::ChooseSection))
    }

    async fn choose_section(&self, context: &mut FlowContext) -> Result<StepOutcome, FlowError> {
        let department = context
            .department
            .expect("department is collected before the section step");

        // Only the chosen department's sections are ever offered.
        let section = self
            .choose(
                FlowStep::ChooseSection,
                "Select a section of the department",
                department.sections(),
            )
            .await?;
        context.section = Some(section);

        match context.action {
            Some(Action::Find) => self.lookup(context).await,
            _ => Ok(StepOutcome::Next(FlowStep::ChooseLocation)),
        }
    }

    async fn choose_location(&self, context: &mut FlowContext) -> Result<StepOutcome, FlowError> {
        let location = self
            .choose(
                FlowStep::ChooseLocation,
                "Select a location",
                &Location::ALL,
            )
            .await?;
        context.location = Some(location);
        Ok(StepOutcome::Next(FlowStep::EnterDetails))
    }

    async fn enter_details(&self, context: &mut FlowContext) -> Result<StepOutcome, FlowError> {
        loop {
            let answer = self.host.ask("Please enter the details.").await?;
            let details = answer.trim();
            if !details.is_empty() {
                if let Some(ref transcript) = self.transcript {
                    transcript.write_answer(FlowStep::EnterDetails.as_str(), details);
                }
                context.details = Some(details.to_string());
                return Ok(StepOutcome::Next(FlowStep::Confirm));
            }

            self.logger.log(&LogEvent::DetailsRejected);
            self.host.tell("Details cannot be empty.").await?;
        }
    }

    async fn confirm_record(&self, context: &mut FlowContext) -> Result<StepOutcome, FlowError> {
        let record = context
            .help_record()
            .expect("all fields are collected before the confirm step");

        self.host
            .tell(&format!(
                "You have entered below info for {} of {} department at {}",
                record.section, record.department, record.location
            ))
            .await?;
        self.host.tell(&record.details).await?;

        loop {
            let confirmed = self.host.confirm("Does it look ok?").await?;
            if let Some(ref transcript) = self.transcript {
                transcript.write_answer(
                    FlowStep::Confirm.as_str(),
                    if confirmed { "yes" } else { "no" },
                );
            }

            if !confirmed {
                self.logger.log(&LogEvent::RecordDiscarded);
                self.host.tell("Discarded the data, please try again").await?;
                return Ok(StepOutcome::End(FlowOutcome::discarded(
                    context.total_duration(),
                )));
            }

            // Bound to a statement so the store lock is released before the
            // next suspension point.
            let inserted = self.db.records().insert(&record);
            match inserted {
                Ok(id) => {
                    self.logger.log(&LogEvent::RecordSaved {
                        id,
                        department: record.department.to_string(),
                        section: record.section.to_string(),
                        location: record.location.to_string(),
                    });
                    self.host
                        .tell("Thanks, data has been added successfully!")
                        .await?;
                    return Ok(StepOutcome::End(FlowOutcome::saved(
                        id,
                        record,
                        context.total_duration(),
                    )));
                }
                Err(StoreError::Unavailable(e)) => {
                    self.logger.log(&LogEvent::StorageUnavailable {
                        error: e.to_string(),
                    });
                    warn!(error = %e, "could not commit record");
                    // The in-flight record is kept; re-issue the same
                    // confirmation prompt so the save can be retried.
                    self.host
                        .tell("Something went wrong while saving. Your entry is still here; answer yes to try again.")
                        .await?;
                }
                Err(e @ StoreError::SectionOutsideDepartment { .. }) => {
                    return Err(e.into());
                }
            }
        }
    }

    async fn lookup(&self, context: &mut FlowContext) -> Result<StepOutcome, FlowError> {
        let department = context
            .department
            .expect("department is collected before the lookup");
        let section = context
            .section
            .expect("section is collected before the lookup");

        // Bound to a statement so the store lock is released before the
        // next suspension point.
        let looked_up = self
            .db
            .records()
            .find_by_department_and_section(department, section);
        let matches = match looked_up {
            Ok(matches) => matches,
            Err(e) => {
                self.logger.log(&LogEvent::StorageUnavailable {
                    error: e.to_string(),
                });
                self.host
                    .tell("Something went wrong looking that up. Please try again later.")
                    .await?;
                return Err(e.into());
            }
        };

        if matches.is_empty() {
            self.host
                .tell(&format!("No records found for {} / {}.", department, section))
                .await?;
        } else {
            self.host
                .tell(&format!(
                    "Found {} record(s) for {} / {}:",
                    matches.len(),
                    department,
                    section
                ))
                .await?;
            for record in &matches {
                self.host
                    .tell(&format!(
                        "  #{} [{}] {}",
                        record.id, record.location, record.details
                    ))
                    .await?;
            }
        }

        self.logger.log(&LogEvent::LookupCompleted {
            department: department.to_string(),
            section: section.to_string(),
            matches: matches.len(),
        });

        Ok(StepOutcome::End(FlowOutcome::found(
            department,
            section,
            matches,
            context.total_duration(),
        )))
    }

    /// Present a closed set of options and keep re-prompting until the
    /// answer names one of them.
    async fn choose<T>(
        &self,
        step: FlowStep,
        prompt: &str,
        options: &[T],
    ) -> Result<T, FlowError>
    where
        T: Copy + fmt::Display + FromStr,
    {
        let labels: Vec<String> = options.iter().map(|o| o.to_string()).collect();
        let label_refs: Vec<&str> = labels.iter().map(String::as_str).collect();

        loop {
            let answer = self.host.choose(prompt, &label_refs).await?;
            let trimmed = answer.trim();

            // Membership is checked against the offered labels, not just
            // parseability: a valid member outside the offered subset is
            // still rejected.
            if let Ok(value) = trimmed.parse::<T>() {
                if labels.iter().any(|label| *label == value.to_string()) {
                    if let Some(ref transcript) = self.transcript {
                        transcript.write_answer(step.as_str(), &value.to_string());
                    }
                    return Ok(value);
                }
            }

            self.logger.log(&LogEvent::ChoiceRejected {
                step: step.to_string(),
                answer: trimmed.to_string(),
            });
            warn!(step = %step, answer = trimmed, "answer outside the offered set");
            self.host
                .tell(&format!("'{}' is not one of the offered options.", trimmed))
                .await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use helpdesk_db::{Department, HelpRecord, Location, Section};
    use helpdesk_logging::LogFormat;

    #[derive(Debug, Clone, Copy)]
    enum Answer {
        Choice(&'static str),
        Text(&'static str),
        Confirm(bool),
        Close,
    }

    /// Replays canned answers and records everything it was told or offered.
    struct ScriptedHost {
        answers: Mutex<VecDeque<Answer>>,
        told: Mutex<Vec<String>>,
        offered: Mutex<Vec<Vec<String>>>,
    }

    impl ScriptedHost {
        fn new(answers: Vec<Answer>) -> Self {
            Self {
                answers: Mutex::new(answers.into_iter().collect()),
                told: Mutex::new(Vec::new()),
                offered: Mutex::new(Vec::new()),
            }
        }

        fn next(&self) -> Option<Answer> {
            self.answers.lock().unwrap().pop_front()
        }

        fn told(&self) -> Vec<String> {
            self.told.lock().unwrap().clone()
        }

        fn offered(&self) -> Vec<Vec<String>> {
            self.offered.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PromptHost for ScriptedHost {
        async fn choose(&self, _prompt: &str, options: &[&str]) -> Result<String, HostError> {
            self.offered
                .lock()
                .unwrap()
                .push(options.iter().map(|o| o.to_string()).collect());
            match self.next() {
                Some(Answer::Choice(s)) => Ok(s.to_string()),
                Some(Answer::Close) | None => Err(HostError::Closed),
                Some(other) => panic!("unexpected answer for choice prompt: {:?}", other),
            }
        }

        async fn ask(&self, _prompt: &str) -> Result<String, HostError> {
            match self.next() {
                Some(Answer::Text(s)) => Ok(s.to_string()),
                Some(Answer::Close) | None => Err(HostError::Closed),
                Some(other) => panic!("unexpected answer for text prompt: {:?}", other),
            }
        }

        async fn confirm(&self, _prompt: &str) -> Result<bool, HostError> {
            match self.next() {
                Some(Answer::Confirm(yes)) => Ok(yes),
                Some(Answer::Close) | None => Err(HostError::Closed),
                Some(other) => panic!("unexpected answer for confirm prompt: {:?}", other),
            }
        }

        async fn tell(&self, message: &str) -> Result<(), HostError> {
            self.told.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    fn test_logger() -> Arc<Logger> {
        Arc::new(Logger::new(LogFormat::Compact))
    }

    fn save_script(details: &'static str) -> Vec<Answer> {
        vec![
            Answer::Choice("Save"),
            Answer::Choice("Finance"),
            Answer::Choice("Tax"),
            Answer::Choice("Pune"),
            Answer::Text(details),
            Answer::Confirm(true),
        ]
    }

    #[tokio::test]
    async fn save_path_persists_record() {
        let db = Database::open_in_memory().unwrap();
        let host = ScriptedHost::new(save_script("printer jammed"));
        let runner = FlowRunner::new(&host, &db, test_logger());

        let outcome = runner.run(FlowContext::new()).await.unwrap();

        assert!(outcome.is_saved());
        let found = db
            .records()
            .find_by_department_and_section(Department::Finance, Section::Tax)
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].department, Department::Finance);
        assert_eq!(found[0].section, Section::Tax);
        assert_eq!(found[0].location, Location::Pune);
        assert_eq!(found[0].details, "printer jammed");
        assert!(host
            .told()
            .iter()
            .any(|m| m.contains("added successfully")));
    }

    #[tokio::test]
    async fn decline_at_confirm_leaves_no_rows() {
        let db = Database::open_in_memory().unwrap();
        let host = ScriptedHost::new(vec![
            Answer::Choice("Save"),
            Answer::Choice("Finance"),
            Answer::Choice("Tax"),
            Answer::Choice("Pune"),
            Answer::Text("x"),
            Answer::Confirm(false),
        ]);
        let runner = FlowRunner::new(&host, &db, test_logger());

        let outcome = runner.run(FlowContext::new()).await.unwrap();

        assert_eq!(outcome.status(), "discarded");
        assert_eq!(db.records().count().unwrap(), 0);
        assert!(host.told().iter().any(|m| m.contains("Discarded")));
    }

    #[tokio::test]
    async fn find_path_returns_matches() {
        let db = Database::open_in_memory().unwrap();
        db.records()
            .insert(&HelpRecord {
                department: Department::Finance,
                section: Section::Tax,
                location: Location::Pune,
                details: "form 16 missing".to_string(),
            })
            .unwrap();
        db.records()
            .insert(&HelpRecord {
                department: Department::Healthcare,
                section: Section::Doctor,
                location: Location::Chennai,
                details: "need an appointment".to_string(),
            })
            .unwrap();

        let host = ScriptedHost::new(vec![
            Answer::Choice("Find"),
            Answer::Choice("Finance"),
            Answer::Choice("Tax"),
        ]);
        let runner = FlowRunner::new(&host, &db, test_logger());

        let outcome = runner.run(FlowContext::new()).await.unwrap();

        match outcome {
            FlowOutcome::Found {
                department,
                section,
                matches,
                ..
            } => {
                assert_eq!(department, Department::Finance);
                assert_eq!(section, Section::Tax);
                assert_eq!(matches.len(), 1);
                assert_eq!(matches[0].details, "form 16 missing");
            }
            other => panic!("expected Found, got {:?}", other),
        }
        assert!(host.told().iter().any(|m| m.contains("form 16 missing")));
    }

    #[tokio::test]
    async fn find_on_empty_store_is_not_an_error() {
        let db = Database::open_in_memory().unwrap();
        let host = ScriptedHost::new(vec![
            Answer::Choice("Find"),
            Answer::Choice("HR"),
            Answer::Choice("Policy"),
        ]);
        let runner = FlowRunner::new(&host, &db, test_logger());

        let outcome = runner.run(FlowContext::new()).await.unwrap();

        match outcome {
            FlowOutcome::Found { matches, .. } => assert!(matches.is_empty()),
            other => panic!("expected Found, got {:?}", other),
        }
        assert!(host.told().iter().any(|m| m.contains("No records found")));
    }

    #[tokio::test]
    async fn invalid_department_reprompts_same_step() {
        let db = Database::open_in_memory().unwrap();
        let host = ScriptedHost::new(vec![
            Answer::Choice("Save"),
            Answer::Choice("Marketing"),
            Answer::Choice("HR"),
            Answer::Choice("Holidays"),
            Answer::Choice("Gurgaon"),
            Answer::Text("leave balance wrong"),
            Answer::Confirm(true),
        ]);
        let runner = FlowRunner::new(&host, &db, test_logger());

        let outcome = runner.run(FlowContext::new()).await.unwrap();

        assert!(outcome.is_saved());
        assert!(host
            .told()
            .iter()
            .any(|m| m.contains("'Marketing' is not one of the offered options")));
        let found = db
            .records()
            .find_by_department_and_section(Department::Hr, Section::Holidays)
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn section_outside_department_is_rejected_at_prompt() {
        let db = Database::open_in_memory().unwrap();
        // Tax is a real section, but not an HR one.
        let host = ScriptedHost::new(vec![
            Answer::Choice("Save"),
            Answer::Choice("HR"),
            Answer::Choice("Tax"),
            Answer::Choice("Policy"),
            Answer::Choice("Pune"),
            Answer::Text("policy unclear"),
            Answer::Confirm(true),
        ]);
        let runner = FlowRunner::new(&host, &db, test_logger());

        let outcome = runner.run(FlowContext::new()).await.unwrap();

        assert!(outcome.is_saved());
        let found = db
            .records()
            .find_by_department_and_section(Department::Hr, Section::Policy)
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(
            db.records()
                .find_by_department_and_section(Department::Finance, Section::Tax)
                .unwrap()
                .len(),
            0
        );
    }

    #[tokio::test]
    async fn each_department_offers_exactly_its_sections() {
        for department in Department::ALL {
            let db = Database::open_in_memory().unwrap();
            let host = ScriptedHost::new(vec![
                Answer::Choice("Find"),
                Answer::Choice(department.as_str()),
                Answer::Close,
            ]);
            let runner = FlowRunner::new(&host, &db, test_logger());

            let outcome = runner.run(FlowContext::new()).await.unwrap();
            assert_eq!(outcome.status(), "abandoned");

            let offered = host.offered();
            let section_options = offered.last().unwrap();
            let expected: Vec<String> = department
                .sections()
                .iter()
                .map(|s| s.to_string())
                .collect();
            assert_eq!(section_options, &expected);
        }
    }

    #[tokio::test]
    async fn empty_details_reprompts_until_non_blank() {
        let db = Database::open_in_memory().unwrap();
        let host = ScriptedHost::new(vec![
            Answer::Choice("Save"),
            Answer::Choice("Healthcare"),
            Answer::Choice("Oxygen"),
            Answer::Choice("Bangalore"),
            Answer::Text(""),
            Answer::Text("   "),
            Answer::Text("cylinder empty in ward 2"),
            Answer::Confirm(true),
        ]);
        let runner = FlowRunner::new(&host, &db, test_logger());

        let outcome = runner.run(FlowContext::new()).await.unwrap();

        assert!(outcome.is_saved());
        assert!(host
            .told()
            .iter()
            .any(|m| m.contains("Details cannot be empty")));
        let found = db
            .records()
            .find_by_department_and_section(Department::Healthcare, Section::Oxygen)
            .unwrap();
        assert_eq!(found[0].details, "cylinder empty in ward 2");
    }

    #[tokio::test]
    async fn abandoned_at_location_leaves_no_rows() {
        let db = Database::open_in_memory().unwrap();
        let host = ScriptedHost::new(vec![
            Answer::Choice("Save"),
            Answer::Choice("HR"),
            Answer::Choice("Policy"),
            Answer::Close,
        ]);
        let runner = FlowRunner::new(&host, &db, test_logger());

        let outcome = runner.run(FlowContext::new()).await.unwrap();

        match outcome {
            FlowOutcome::Abandoned { step, .. } => assert_eq!(step, FlowStep::ChooseLocation),
            other => panic!("expected Abandoned, got {:?}", other),
        }
        assert_eq!(db.records().count().unwrap(), 0);
    }

    #[tokio::test]
    async fn storage_failure_at_confirm_keeps_record_and_reprompts() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("helpdesk.db");
        let db = Database::open_at(&path).unwrap();

        // Sabotage the table behind the store's back so the insert fails.
        let raw = rusqlite::Connection::open(&path).unwrap();
        raw.execute_batch("DROP TABLE facility_data;").unwrap();

        let host = ScriptedHost::new(vec![
            Answer::Choice("Save"),
            Answer::Choice("Finance"),
            Answer::Choice("Salary"),
            Answer::Choice("Chennai"),
            Answer::Text("salary not credited"),
            Answer::Confirm(true),
            Answer::Confirm(false),
        ]);
        let runner = FlowRunner::new(&host, &db, test_logger());

        let outcome = runner.run(FlowContext::new()).await.unwrap();

        // The failed save fell back to the same confirmation prompt, and
        // the second answer declined.
        assert_eq!(outcome.status(), "discarded");
        assert!(host
            .told()
            .iter()
            .any(|m| m.contains("Something went wrong while saving")));
    }

    #[tokio::test]
    async fn transcript_records_accepted_answers() {
        let dir = tempfile::TempDir::new().unwrap();
        let transcript = TranscriptWriter::new_in(dir.path(), "t").unwrap();
        let transcript_path = transcript.path().to_path_buf();

        let db = Database::open_in_memory().unwrap();
        let host = ScriptedHost::new(save_script("x"));
        let runner =
            FlowRunner::new(&host, &db, test_logger()).with_transcript(transcript);

        runner.run(FlowContext::new()).await.unwrap();

        let content = std::fs::read_to_string(transcript_path).unwrap();
        assert!(content.contains("\"answer\":\"Finance\""));
        assert!(content.contains("\"answer\":\"Tax\""));
        assert!(content.contains("\"outcome\":\"saved\""));
    }
}
