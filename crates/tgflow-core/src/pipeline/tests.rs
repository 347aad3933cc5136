use super::*;
use crate::test_support::TestUpdate;
use std::sync::Mutex;

/// Records its name into a shared log, then returns a fixed flow
struct Recorder {
    name: &'static str,
    flow: Flow,
    log: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl Stage<TestUpdate> for Recorder {
    fn name(&self) -> &str {
        self.name
    }

    async fn handle(&self, _update: &mut TestUpdate, _cancel: &CancellationToken) -> Result<Flow> {
        self.log.lock().unwrap().push(self.name);
        Ok(self.flow)
    }
}

struct Failing;

#[async_trait]
impl Stage<TestUpdate> for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    async fn handle(&self, _update: &mut TestUpdate, _cancel: &CancellationToken) -> Result<Flow> {
        Err(Error::Pipeline("malformed update".to_string()))
    }
}

struct Rejecting;

#[async_trait]
impl Stage<TestUpdate> for Rejecting {
    fn name(&self) -> &str {
        "rejecting"
    }

    async fn handle(&self, update: &mut TestUpdate, _cancel: &CancellationToken) -> Result<Flow> {
        update.set_outcome(Outcome::Failed("not allowed".to_string()));
        Ok(Flow::Stop)
    }
}

fn recorder(name: &'static str, flow: Flow, log: &Arc<Mutex<Vec<&'static str>>>) -> Recorder {
    Recorder {
        name,
        flow,
        log: Arc::clone(log),
    }
}

#[test]
fn test_check_rejects_empty_pipeline() {
    let pipeline: Pipeline<TestUpdate> = Pipeline::builder().build();
    assert!(matches!(pipeline.check(), Err(Error::PipelineCheck(_))));
}

#[test]
fn test_check_rejects_duplicate_names() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let pipeline = Pipeline::builder()
        .stage(recorder("auth", Flow::Continue, &log))
        .stage(recorder("auth", Flow::Stop, &log))
        .build();

    let err = pipeline.check().unwrap_err();
    assert!(err.to_string().contains("pipeline check failed"));
}

#[tokio::test]
async fn test_stages_run_in_order_until_stop() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let pipeline = Pipeline::builder()
        .stage(recorder("logging", Flow::Continue, &log))
        .stage(recorder("commands", Flow::Stop, &log))
        .stage(recorder("fallback", Flow::Stop, &log))
        .build();
    assert!(pipeline.check().is_ok());
    assert_eq!(pipeline.stage_names(), vec!["logging", "commands", "fallback"]);

    let mut update = TestUpdate::new("/start");
    pipeline
        .execute(&mut update, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["logging", "commands"]);
    assert_eq!(*update.outcome(), Outcome::Handled);
}

#[tokio::test]
async fn test_unclaimed_update_stays_unhandled() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let pipeline = Pipeline::builder()
        .stage(recorder("logging", Flow::Continue, &log))
        .build();

    let mut update = TestUpdate::new("sticker");
    pipeline
        .execute(&mut update, &CancellationToken::new())
        .await
        .unwrap();

    assert!(update.outcome().is_unhandled());
}

#[tokio::test]
async fn test_stage_outcome_is_kept() {
    let pipeline = Pipeline::builder().stage(Rejecting).build();

    let mut update = TestUpdate::new("/admin");
    pipeline
        .execute(&mut update, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(*update.outcome(), Outcome::Failed("not allowed".to_string()));
}

#[tokio::test]
async fn test_stage_error_stops_chain() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let pipeline = Pipeline::builder()
        .stage(Failing)
        .stage(recorder("after", Flow::Stop, &log))
        .build();

    let mut update = TestUpdate::new("bad");
    let result = pipeline.execute(&mut update, &CancellationToken::new()).await;

    assert!(matches!(result, Err(Error::Pipeline(_))));
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_cancelled_pipeline_runs_no_stage() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let pipeline = Pipeline::builder()
        .stage(recorder("logging", Flow::Continue, &log))
        .build();

    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut update = TestUpdate::new("late");
    let result = pipeline.execute(&mut update, &cancel).await;

    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(log.lock().unwrap().is_empty());
}
