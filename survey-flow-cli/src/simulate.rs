//! Scripted respondent runs.

use std::io::Write;

use anyhow::{Context, Result, bail};
use survey_flow::{
    Answer, Answers, FlowBackend, FlowController, FlowError, FlowState, Navigation,
    RespondentIntake, Step,
};

/// How a scripted run ended.
#[derive(Debug, PartialEq)]
pub enum Outcome {
    Completed { answered: usize },

    /// A required question had no scripted answer.
    Stopped { question: String, reason: String },
}

/// Walk a session through `script`, writing one line per step to `out`.
///
/// Questions without a scripted answer are skipped where allowed.
pub async fn run<B: FlowBackend + ?Sized>(
    flow: &mut FlowController<B>,
    intake: RespondentIntake,
    script: &Answers,
    out: &mut impl Write,
) -> Result<Outcome> {
    let progress = flow
        .start_survey(intake)
        .await
        .context("Failed to start the survey")?;
    writeln!(out, "started {} ({})", flow.definition().id, progress)?;

    // Backward jumps can cycle forever with a fixed script.
    let max_steps = flow.definition().len() * 4 + 1;

    for _ in 0..max_steps {
        let Some(question) = flow.current_question() else {
            break;
        };
        let id = question.id().clone();

        if let Some(value) = script.get(id.as_str()) {
            let receipt = flow.submit_answer(Answer::new(id.clone(), value.clone())).await?;
            writeln!(out, "  {} = {}", id, value.text_form())?;
            for diagnostic in &receipt.diagnostics {
                writeln!(out, "  ! {}", diagnostic)?;
            }
        }

        match flow.advance().await {
            Ok(navigation) => report(&navigation, flow, out)?,
            Err(FlowError::Validation { question_id, reason }) => {
                writeln!(out, "stopped at {}: {}", question_id, reason)?;
                return Ok(Outcome::Stopped {
                    question: question_id.to_string(),
                    reason,
                });
            }
            Err(err) => return Err(err.into()),
        }
    }

    if flow.state() != FlowState::Complete {
        bail!("The script did not finish the survey within {} steps", max_steps);
    }
    let answered = flow.answers().map_or(0, Answers::len);
    writeln!(out, "complete with {} answers", answered)?;
    Ok(Outcome::Completed { answered })
}

fn report<B: FlowBackend + ?Sized>(
    navigation: &Navigation,
    flow: &FlowController<B>,
    out: &mut impl Write,
) -> Result<()> {
    let next = flow
        .current_question()
        .map(|question| question.id().to_string());
    match (navigation.step, next) {
        (Step::Jump { .. }, Some(next)) => writeln!(out, "-> jump to {} [{}]", next, navigation.progress)?,
        (Step::Complete { ended_early: true }, _) => writeln!(out, "-> ended early [{}]", navigation.progress)?,
        (Step::Complete { ended_early: false }, _) => writeln!(out, "-> end of survey [{}]", navigation.progress)?,
        (_, Some(next)) => writeln!(out, "-> {} [{}]", next, navigation.progress)?,
        (_, None) => {}
    }
    for diagnostic in &navigation.diagnostics {
        writeln!(out, "  ! {}", diagnostic)?;
    }
    Ok(())
}
