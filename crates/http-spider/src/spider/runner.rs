use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{info, info_span, warn, Instrument};

use super::{FailedStep, Spider};
use crate::error::{ExecutorError, RuleError, SpiderError, StorageError};
use crate::http::{Response, SendOptions};
use crate::step::Step;
use crate::storage::append_to_file;

/// Longest body excerpt copied into the debug log per step.
const LOG_PREVIEW_BYTES: usize = 200;

impl Spider {
    /// Executes every queued step in insertion order.
    ///
    /// Stops at the first transport error, send error, storage error or
    /// failure rule. On success the queue is emptied and all responses
    /// recorded so far are returned.
    pub async fn run(&mut self) -> Result<&IndexMap<String, Option<Response>>, SpiderError> {
        let span = info_span!("spider_run", steps = self.steps.len());
        self.run_queued().instrument(span).await?;
        Ok(&self.responses)
    }

    async fn run_queued(&mut self) -> Result<(), SpiderError> {
        self.failed_step = None;
        self.log("Spider run started")?;

        // Steps stay queued until the whole run has succeeded.
        let mut failure = None;
        for index in 0..self.steps.len() {
            let (name, step) = match self.steps.get_index(index) {
                Some((name, step)) => (name.clone(), step.clone()),
                None => break,
            };

            let span = info_span!("step", index, name = %name);
            let response = match self.run_step(&name, &step).instrument(span.clone()).await {
                Ok(response) => response,
                Err(err) => {
                    failure = Some((index, name, err, None));
                    break;
                }
            };

            match span.in_scope(|| self.check_failure_rules(&step, &response)) {
                Ok(()) => {
                    self.responses.insert(name, Some(response));
                }
                Err(err) => {
                    failure = Some((index, name, err, Some(response)));
                    break;
                }
            }
        }

        if let Some((index, name, err, response)) = failure {
            warn!(step = %name, index, error = %err, "Spider run aborted");
            if let Err(log_err) = self.log(&format!("Error in step [{}]: {}", name, err)) {
                warn!("Unable to record failure in debug log: {}", log_err);
            }
            self.failed_step = Some(FailedStep {
                index,
                name,
                response,
            });
            return Err(err);
        }

        info!(steps = self.steps.len(), "Spider run finished");
        self.log("All steps finished, removing them from the queue")?;
        self.steps.clear();
        Ok(())
    }

    /// Sends one step and persists its body. The response is only recorded
    /// by the caller once every failure rule has passed.
    async fn run_step(&mut self, name: &str, step: &Step) -> Result<Response, SpiderError> {
        // Taken up front so the sink never outlives the step, whatever the outcome.
        let sink = self.sink.take();
        self.responses.insert(name.to_string(), None);
        self.steps_executed += 1;

        self.log(&format!("Started step [{}] {} {}", name, step.method(), step.url()))?;

        if let Some(path) = &sink {
            self.log(&format!("Sink for step [{}] set to {}", name, path.display()))?;
        }

        let request = step.request();
        let jar = self.cookie_jar.clone();
        let options = SendOptions {
            allow_redirects: true,
            cookie_jar: &jar,
            timeout: step.timeout(),
            sink: sink.as_deref(),
        };

        let executor = Arc::clone(&self.executor);
        let response = executor
            .send(&request, options)
            .await
            .map_err(|err| send_error(name, err))?;

        info!(status = response.status, bytes = response.body.len(), "Step response received");

        let label = format!("{}_{}", self.steps_executed, name);
        self.save_debug_artifact(response.body(), &label)?;

        if let Some(path) = step
            .local_file_path()
            .filter(|_| step.needs_response_saved_to_local_file())
        {
            let written = append_to_file(path, response.body())?;
            self.record_local_file(name, path);
            self.log(&format!(
                "Appended {} bytes to local file {}",
                written,
                path.display()
            ))?;
        }

        self.log(&format!(
            "Finished step [{}] {}",
            name,
            preview(response.body())
        ))?;

        Ok(response)
    }

    /// Evaluates the step's rules in attachment order; the first error wins.
    fn check_failure_rules(&self, step: &Step, response: &Response) -> Result<(), SpiderError> {
        for rule in step.failure_rules().values() {
            if let Err(err) = rule.evaluate(response) {
                match &err {
                    RuleError::Triggered { name } => {
                        self.log(&format!("Failure rule [{}] triggered", name))?
                    }
                    other => self.log(&format!(
                        "Failure rule [{}] could not be evaluated: {}",
                        rule.name(),
                        other
                    ))?,
                }
                return Err(err.into());
            }
        }
        Ok(())
    }
}

fn send_error(step: &str, err: ExecutorError) -> SpiderError {
    match err {
        err @ ExecutorError::Transport(_) => SpiderError::Transport {
            step: step.to_string(),
            source: err,
        },
        ExecutorError::Sink { path, source } => StorageError::WriteSink { path, source }.into(),
        other => SpiderError::RequestSend {
            step: step.to_string(),
            source: other,
        },
    }
}

fn preview(body: &[u8]) -> String {
    let cut = body.len().min(LOG_PREVIEW_BYTES);
    let mut text = String::from_utf8_lossy(&body[..cut]).replace(['\r', '\n'], " ");
    if body.len() > cut {
        text.push_str("...");
    }
    text
}
