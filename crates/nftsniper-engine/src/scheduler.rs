//! Per-collection task scheduling

use crate::notifier::EventNotifier;
use alloy_primitives::Address;
use chrono::Utc;
use nftsniper_core::{
    matcher, parse_contract, BuyErrorEvent, BuySuccessEvent, CandidateOrder, GenericErrorEvent,
    ListingSource, MatchResult, NoDataEvent, ProtocolClient, PurchaseOutcome, StartBuyEvent, Task,
    TaskEndEvent, TaskError, TaskEvent, TaskSpec,
};
use nftsniper_execution::PurchaseOrchestrator;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, RwLock};
use tracing::{debug, info, warn};

/// Registry record for one running task
struct TaskEntry {
    task: Task,
    cancel: Arc<Notify>,
}

/// What a finished cycle tells its loop to do next
enum Cycle {
    Continue,
    Stop,
}

/// Owns the task registry and drives one polling loop per task.
///
/// A task dies only by satisfaction or explicit removal; every transient
/// failure inside a cycle resolves to an event plus a reschedule. Each
/// task's cycle runs to completion before its next timer is armed, so there
/// is at most one in-flight poll per task and `success_count` updates are
/// race-free.
pub struct TaskScheduler<S, P> {
    inner: Arc<SchedulerInner<S, P>>,
}

struct SchedulerInner<S, P> {
    tasks: RwLock<HashMap<Address, TaskEntry>>,
    source: Arc<S>,
    orchestrator: PurchaseOrchestrator<P>,
    notifier: Arc<EventNotifier>,
}

impl<S, P> TaskScheduler<S, P>
where
    S: ListingSource + 'static,
    P: ProtocolClient + 'static,
{
    pub fn new(
        source: Arc<S>,
        orchestrator: PurchaseOrchestrator<P>,
        notifier: Arc<EventNotifier>,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                tasks: RwLock::new(HashMap::new()),
                source,
                orchestrator,
                notifier,
            }),
        }
    }

    /// Validate and register a watch task, spawning its polling loop.
    ///
    /// The first poll fires one interval after registration. Returns the
    /// normalized contract key; duplicates are rejected against that key, so
    /// two hex spellings of one address are one task.
    pub async fn add_task(&self, spec: TaskSpec) -> Result<Address, TaskError> {
        let task = spec.into_task()?;
        let contract = task.contract;

        let mut tasks = self.inner.tasks.write().await;
        if tasks.contains_key(&contract) {
            return Err(TaskError::DuplicateContract(contract));
        }

        let cancel = Arc::new(Notify::new());
        let entry = TaskEntry {
            task,
            cancel: Arc::clone(&cancel),
        };

        // The loop's first registry access waits on this write lock, so the
        // entry is visible before its first cycle.
        tokio::spawn(run_loop(Arc::clone(&self.inner), contract, cancel));
        tasks.insert(contract, entry);

        info!(contract = %contract, "Task added");
        Ok(contract)
    }

    /// Cancel and delete a task. Emits nothing.
    ///
    /// The pending timer is cancelled synchronously; a cycle already in
    /// flight finishes and then no-ops its final mutation.
    pub async fn remove_task(&self, contract: &str) -> Result<(), TaskError> {
        let contract = parse_contract(contract)?;

        let mut tasks = self.inner.tasks.write().await;
        match tasks.remove(&contract) {
            Some(entry) => {
                entry.cancel.notify_one();
                info!(contract = %contract, "Task removed");
                Ok(())
            }
            None => Err(TaskError::NotFound(contract)),
        }
    }

    /// Read-only snapshot of a task
    pub async fn get_task(&self, contract: &str) -> Option<Task> {
        let contract = parse_contract(contract).ok()?;
        self.inner.snapshot(contract).await
    }

    /// Number of registered tasks
    pub async fn task_count(&self) -> usize {
        self.inner.tasks.read().await.len()
    }

    /// Cancel every task without emitting events
    pub async fn shutdown(&self) {
        let mut tasks = self.inner.tasks.write().await;
        for (contract, entry) in tasks.drain() {
            entry.cancel.notify_one();
            debug!(contract = %contract, "Task cancelled at shutdown");
        }
    }
}

/// One task's polling loop. Exits when the registry entry disappears or a
/// cycle reports a terminal state; the handle is detached, never aborted.
async fn run_loop<S, P>(inner: Arc<SchedulerInner<S, P>>, contract: Address, cancel: Arc<Notify>)
where
    S: ListingSource + 'static,
    P: ProtocolClient + 'static,
{
    loop {
        let interval = match inner.poll_interval(contract).await {
            Some(interval) => interval,
            None => break,
        };

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = cancel.notified() => {
                debug!(contract = %contract, "Task loop cancelled");
                break;
            }
        }

        match inner.run_cycle(contract).await {
            Cycle::Continue => {}
            Cycle::Stop => break,
        }
    }
}

impl<S, P> SchedulerInner<S, P>
where
    S: ListingSource + 'static,
    P: ProtocolClient + 'static,
{
    async fn poll_interval(&self, contract: Address) -> Option<Duration> {
        self.tasks
            .read()
            .await
            .get(&contract)
            .map(|entry| entry.task.poll_interval())
    }

    async fn snapshot(&self, contract: Address) -> Option<Task> {
        self.tasks
            .read()
            .await
            .get(&contract)
            .map(|entry| entry.task.clone())
    }

    /// One wake of a task: discover, match, buy, apply the outcome
    async fn run_cycle(&self, contract: Address) -> Cycle {
        // Removed while the timer slept: stop silently
        let task = match self.snapshot(contract).await {
            Some(task) => task,
            None => return Cycle::Stop,
        };

        if task.is_satisfied() {
            return self.finish(contract).await;
        }

        let candidates = match self
            .source
            .fetch_listings(contract, task.ceiling_price)
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(
                    contract = %contract,
                    source = self.source.name(),
                    error = %e,
                    "Listing discovery failed"
                );
                self.notifier.emit(&TaskEvent::GenericError(GenericErrorEvent::new(
                    contract,
                    e.to_string(),
                )));
                return Cycle::Continue;
            }
        };

        let now = Utc::now().timestamp().max(0) as u64;
        let listing = match matcher::select_best(task.ceiling_price, now, &candidates) {
            MatchResult::Matched(listing) => listing,
            MatchResult::NoMatch => {
                debug!(
                    contract = %contract,
                    candidates = candidates.len(),
                    "No listing under the ceiling"
                );
                self.notifier.emit(&TaskEvent::NoData(NoDataEvent::new(
                    contract,
                    "no listing under the ceiling",
                )));
                return Cycle::Continue;
            }
        };

        self.notifier.emit(&TaskEvent::StartBuy(StartBuyEvent::new(
            contract,
            listing.listing_id.clone(),
            listing.price,
        )));

        let outcome = self.orchestrator.attempt(&task, &listing).await;
        self.apply_outcome(contract, &listing, outcome).await
    }

    async fn apply_outcome(
        &self,
        contract: Address,
        listing: &CandidateOrder,
        outcome: PurchaseOutcome,
    ) -> Cycle {
        match outcome {
            PurchaseOutcome::Success(tx_hash) => {
                // The counter update goes through the registry so a task
                // removed mid-flight is not resurrected.
                let updated = {
                    let mut tasks = self.tasks.write().await;
                    match tasks.get_mut(&contract) {
                        Some(entry) => {
                            entry.task.success_count += 1;
                            Some((entry.task.success_count, entry.task.is_satisfied()))
                        }
                        None => None,
                    }
                };

                let Some((success_count, satisfied)) = updated else {
                    debug!(contract = %contract, "Task removed mid-purchase, dropping result");
                    return Cycle::Stop;
                };

                info!(
                    contract = %contract,
                    tx_hash = %tx_hash,
                    success_count,
                    "Purchase succeeded"
                );
                self.notifier.emit(&TaskEvent::BuySuccess(BuySuccessEvent::new(
                    contract,
                    tx_hash,
                    listing.price,
                    success_count,
                )));

                if satisfied {
                    return self.finish(contract).await;
                }
                Cycle::Continue
            }
            PurchaseOutcome::NoListing => {
                self.notifier.emit(&TaskEvent::NoData(NoDataEvent::new(
                    contract,
                    "listing disappeared before purchase",
                )));
                Cycle::Continue
            }
            PurchaseOutcome::NoPriceMatch => {
                self.notifier.emit(&TaskEvent::BuyError(BuyErrorEvent::new(
                    contract,
                    Some(listing.listing_id.clone()),
                    "price moved above the ceiling".to_string(),
                )));
                Cycle::Continue
            }
            PurchaseOutcome::ValidationFailed(reason)
            | PurchaseOutcome::SubmissionFailed(reason) => {
                self.notifier.emit(&TaskEvent::BuyError(BuyErrorEvent::new(
                    contract,
                    Some(listing.listing_id.clone()),
                    reason,
                )));
                Cycle::Continue
            }
        }
    }

    /// Terminal transition: delete the entry and emit the task's single
    /// `TaskEnd`. Emission is gated on the removal actually finding the
    /// entry, which is what makes `TaskEnd` exactly-once.
    async fn finish(&self, contract: Address) -> Cycle {
        let removed = self.tasks.write().await.remove(&contract);

        if let Some(entry) = removed {
            info!(
                contract = %contract,
                success_count = entry.task.success_count,
                "Task satisfied"
            );
            self.notifier.emit(&TaskEvent::TaskEnd(TaskEndEvent::new(
                contract,
                entry.task.success_count,
                entry.task.target_count,
            )));
        }

        Cycle::Stop
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;
    use async_trait::async_trait;
    use nftsniper_core::{
        CounterOrderParams, CredentialsRef, DiscoveryError, ExecutionConfig, PreparedOrder,
        ProtocolError,
    };
    use nftsniper_execution::DryRunProtocol;
    use rust_decimal::Decimal;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    const CONTRACT: &str = "0x06012c8cf97bead5deae237070f9587f8e7a266d";
    const CONTRACT_MIXED: &str = "0x06012C8cf97BEaD5deAe237070F9587f8E7A266d";

    /// Scriptable discovery source: plays back `script`, then repeats
    /// `repeat` (or empty results) forever.
    struct MockListingSource {
        script: Mutex<VecDeque<Result<Vec<CandidateOrder>, DiscoveryError>>>,
        repeat: Option<Vec<CandidateOrder>>,
        fetch_count: AtomicU32,
    }

    impl MockListingSource {
        fn scripted(results: Vec<Result<Vec<CandidateOrder>, DiscoveryError>>) -> Self {
            Self {
                script: Mutex::new(results.into()),
                repeat: None,
                fetch_count: AtomicU32::new(0),
            }
        }

        fn repeating(candidates: Vec<CandidateOrder>) -> Self {
            Self {
                script: Mutex::new(VecDeque::new()),
                repeat: Some(candidates),
                fetch_count: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ListingSource for MockListingSource {
        async fn fetch_listings(
            &self,
            _contract: Address,
            _ceiling: U256,
        ) -> Result<Vec<CandidateOrder>, DiscoveryError> {
            self.fetch_count.fetch_add(1, Ordering::SeqCst);
            if let Some(result) = self.script.lock().unwrap().pop_front() {
                return result;
            }
            match &self.repeat {
                Some(candidates) => Ok(candidates.clone()),
                None => Ok(Vec::new()),
            }
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    /// Protocol double whose validations always reject
    struct RejectingProtocol;

    #[async_trait]
    impl ProtocolClient for RejectingProtocol {
        async fn build_counter_order(
            &self,
            _credentials: &CredentialsRef,
            _listing: &CandidateOrder,
            params: &CounterOrderParams,
        ) -> Result<PreparedOrder, ProtocolError> {
            Ok(PreparedOrder {
                maker: Address::repeat_byte(0x01),
                params: params.clone(),
                payload: serde_json::json!({}),
            })
        }

        async fn validate_order(
            &self,
            _payload: &serde_json::Value,
        ) -> Result<bool, ProtocolError> {
            Ok(false)
        }

        async fn orders_can_match(
            &self,
            _counter: &PreparedOrder,
            _listing: &CandidateOrder,
        ) -> Result<bool, ProtocolError> {
            Ok(true)
        }

        async fn estimate_execution_cost(
            &self,
            _counter: &PreparedOrder,
            _listing: &CandidateOrder,
        ) -> Result<U256, ProtocolError> {
            Ok(U256::from(1_000u64))
        }

        async fn submit_execution(
            &self,
            _counter: &PreparedOrder,
            _listing: &CandidateOrder,
            _budget: U256,
        ) -> Result<alloy_primitives::TxHash, ProtocolError> {
            Err(ProtocolError::Transport("should never submit".to_string()))
        }
    }

    /// Protocol double that parks order construction until released,
    /// holding the purchase in flight at a point the test controls.
    struct GatedProtocol {
        release: Notify,
        inner: DryRunProtocol,
    }

    impl GatedProtocol {
        fn new() -> Self {
            Self {
                release: Notify::new(),
                inner: DryRunProtocol::new(),
            }
        }
    }

    #[async_trait]
    impl ProtocolClient for GatedProtocol {
        async fn build_counter_order(
            &self,
            credentials: &CredentialsRef,
            listing: &CandidateOrder,
            params: &CounterOrderParams,
        ) -> Result<PreparedOrder, ProtocolError> {
            self.release.notified().await;
            self.inner
                .build_counter_order(credentials, listing, params)
                .await
        }

        async fn validate_order(
            &self,
            payload: &serde_json::Value,
        ) -> Result<bool, ProtocolError> {
            self.inner.validate_order(payload).await
        }

        async fn orders_can_match(
            &self,
            counter: &PreparedOrder,
            listing: &CandidateOrder,
        ) -> Result<bool, ProtocolError> {
            self.inner.orders_can_match(counter, listing).await
        }

        async fn estimate_execution_cost(
            &self,
            counter: &PreparedOrder,
            listing: &CandidateOrder,
        ) -> Result<U256, ProtocolError> {
            self.inner.estimate_execution_cost(counter, listing).await
        }

        async fn submit_execution(
            &self,
            counter: &PreparedOrder,
            listing: &CandidateOrder,
            budget: U256,
        ) -> Result<alloy_primitives::TxHash, ProtocolError> {
            self.inner.submit_execution(counter, listing, budget).await
        }
    }

    /// Ceiling of `amount` base units, expressed in whole-coin decimals
    fn wei(amount: i64) -> Decimal {
        Decimal::new(amount, 18)
    }

    fn spec(ceiling_wei: i64, target: u32, interval_ms: u64) -> TaskSpec {
        TaskSpec {
            credentials_ref: "primary".to_string(),
            contract: CONTRACT.to_string(),
            rpc_endpoint: "https://rpc.example.org".to_string(),
            ceiling_price: wei(ceiling_wei),
            target_count: target,
            poll_interval_ms: interval_ms,
        }
    }

    fn candidate(listing_id: &str, price: u64) -> CandidateOrder {
        CandidateOrder {
            listing_id: listing_id.to_string(),
            seller: Address::repeat_byte(0xaa),
            price: U256::from(price),
            expires_at: 0,
            fee_recipient: Address::ZERO,
            raw_payload: serde_json::json!({"side": 1}),
        }
    }

    fn fast_execution() -> ExecutionConfig {
        let mut config = ExecutionConfig::default();
        config.validation_retry_delay_ms = 1;
        config
    }

    fn dry_run_scheduler(
        source: MockListingSource,
    ) -> (
        TaskScheduler<MockListingSource, DryRunProtocol>,
        Arc<EventNotifier>,
    ) {
        let notifier = Arc::new(EventNotifier::new());
        let orchestrator =
            PurchaseOrchestrator::new(Arc::new(DryRunProtocol::new()), fast_execution());
        let scheduler = TaskScheduler::new(Arc::new(source), orchestrator, Arc::clone(&notifier));
        (scheduler, notifier)
    }

    fn capture(notifier: &EventNotifier) -> mpsc::UnboundedReceiver<TaskEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let contract: Address = CONTRACT.parse().unwrap();
        notifier.on(contract, move |event| {
            let _ = tx.send(event.clone());
        });
        rx
    }

    async fn next_event(rx: &mut mpsc::UnboundedReceiver<TaskEvent>) -> TaskEvent {
        timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for an event")
            .expect("event channel closed")
    }

    #[tokio::test]
    async fn test_add_task_rejects_malformed_specs() {
        let (scheduler, _notifier) = dry_run_scheduler(MockListingSource::scripted(vec![]));

        let mut bad_contract = spec(100, 1, 1_000);
        bad_contract.contract = "not-an-address".to_string();
        assert!(matches!(
            scheduler.add_task(bad_contract).await,
            Err(TaskError::InvalidField { .. })
        ));

        assert!(scheduler.add_task(spec(100, 0, 1_000)).await.is_err());
        assert!(scheduler.add_task(spec(100, 1, 0)).await.is_err());
        assert!(scheduler.add_task(spec(0, 1, 1_000)).await.is_err());

        assert_eq!(scheduler.task_count().await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_contracts_collide_across_hex_casings() {
        let (scheduler, _notifier) = dry_run_scheduler(MockListingSource::scripted(vec![]));

        let key = scheduler.add_task(spec(100, 1, 60_000)).await.unwrap();

        let mut recased = spec(100, 1, 60_000);
        recased.contract = CONTRACT_MIXED.to_string();
        match scheduler.add_task(recased).await {
            Err(TaskError::DuplicateContract(contract)) => assert_eq!(contract, key),
            other => panic!("unexpected result: {other:?}"),
        }

        assert_eq!(scheduler.task_count().await, 1);
    }

    #[tokio::test]
    async fn test_get_task_normalizes_its_key_and_exposes_base_units() {
        let (scheduler, _notifier) = dry_run_scheduler(MockListingSource::scripted(vec![]));
        scheduler.add_task(spec(100, 1, 60_000)).await.unwrap();

        let task = scheduler.get_task(CONTRACT_MIXED).await.unwrap();
        assert_eq!(task.ceiling_price, U256::from(100u64));
        assert_eq!(task.success_count, 0);

        assert!(scheduler.get_task("not-an-address").await.is_none());
    }

    #[tokio::test]
    async fn test_remove_task_is_single_shot() {
        let (scheduler, _notifier) = dry_run_scheduler(MockListingSource::scripted(vec![]));
        scheduler.add_task(spec(100, 1, 60_000)).await.unwrap();

        assert!(scheduler.remove_task(CONTRACT).await.is_ok());
        assert!(matches!(
            scheduler.remove_task(CONTRACT).await,
            Err(TaskError::NotFound(_))
        ));
        assert_eq!(scheduler.task_count().await, 0);
    }

    #[tokio::test]
    async fn test_single_purchase_runs_start_success_end() {
        let source = MockListingSource::scripted(vec![Ok(vec![
            candidate("0xcheap", 90),
            candidate("0xrich", 150),
        ])]);
        let (scheduler, notifier) = dry_run_scheduler(source);
        let mut events = capture(&notifier);

        scheduler.add_task(spec(100, 1, 10)).await.unwrap();

        let start = next_event(&mut events).await;
        match &start {
            TaskEvent::StartBuy(e) => {
                assert_eq!(e.listing_id, "0xcheap");
                assert_eq!(e.price, U256::from(90u64));
            }
            other => panic!("expected StartBuy, got {other:?}"),
        }

        let success = next_event(&mut events).await;
        match &success {
            TaskEvent::BuySuccess(e) => {
                assert_eq!(e.price, U256::from(90u64));
                assert_eq!(e.success_count, 1);
            }
            other => panic!("expected BuySuccess, got {other:?}"),
        }

        let end = next_event(&mut events).await;
        match &end {
            TaskEvent::TaskEnd(e) => {
                assert_eq!(e.success_count, 1);
                assert_eq!(e.target_count, 1);
            }
            other => panic!("expected TaskEnd, got {other:?}"),
        }

        assert!(scheduler.get_task(CONTRACT).await.is_none());
        assert_eq!(scheduler.task_count().await, 0);
    }

    #[tokio::test]
    async fn test_discovery_failure_is_survived_and_rearmed() {
        let source = MockListingSource::scripted(vec![
            Err(DiscoveryError::HttpError("connection refused".to_string())),
            Ok(vec![candidate("0xcheap", 90)]),
        ]);
        let (scheduler, notifier) = dry_run_scheduler(source);
        let mut events = capture(&notifier);

        scheduler.add_task(spec(100, 1, 10)).await.unwrap();

        match next_event(&mut events).await {
            TaskEvent::GenericError(e) => assert!(e.message.contains("connection refused")),
            other => panic!("expected GenericError, got {other:?}"),
        }

        // The re-armed cycle completes the purchase
        assert_eq!(next_event(&mut events).await.kind(), "start_buy");
        assert_eq!(next_event(&mut events).await.kind(), "buy_success");
        assert_eq!(next_event(&mut events).await.kind(), "task_end");
    }

    #[tokio::test]
    async fn test_empty_cycles_emit_no_data_and_keep_the_task() {
        let (scheduler, notifier) = dry_run_scheduler(MockListingSource::scripted(vec![]));
        let mut events = capture(&notifier);

        scheduler.add_task(spec(100, 1, 10)).await.unwrap();

        assert_eq!(next_event(&mut events).await.kind(), "no_data");
        assert_eq!(next_event(&mut events).await.kind(), "no_data");

        let task = scheduler.get_task(CONTRACT).await.unwrap();
        assert_eq!(task.success_count, 0);
    }

    #[tokio::test]
    async fn test_candidates_above_the_ceiling_are_no_data() {
        let source = MockListingSource::repeating(vec![candidate("0xrich", 150)]);
        let (scheduler, notifier) = dry_run_scheduler(source);
        let mut events = capture(&notifier);

        scheduler.add_task(spec(100, 1, 10)).await.unwrap();

        assert_eq!(next_event(&mut events).await.kind(), "no_data");
        assert!(scheduler.get_task(CONTRACT).await.is_some());
    }

    #[tokio::test]
    async fn test_validation_rejection_emits_buy_error_and_keeps_counts() {
        let source = MockListingSource::repeating(vec![candidate("0xcheap", 90)]);
        let notifier = Arc::new(EventNotifier::new());
        let orchestrator =
            PurchaseOrchestrator::new(Arc::new(RejectingProtocol), fast_execution());
        let scheduler = TaskScheduler::new(Arc::new(source), orchestrator, Arc::clone(&notifier));
        let mut events = capture(&notifier);

        scheduler.add_task(spec(100, 1, 10)).await.unwrap();

        assert_eq!(next_event(&mut events).await.kind(), "start_buy");
        match next_event(&mut events).await {
            TaskEvent::BuyError(e) => {
                assert_eq!(e.listing_id.as_deref(), Some("0xcheap"));
                assert!(e.reason.contains("failed validation"));
            }
            other => panic!("expected BuyError, got {other:?}"),
        }

        // Rescheduled, not ended
        assert_eq!(next_event(&mut events).await.kind(), "start_buy");
        let task = scheduler.get_task(CONTRACT).await.unwrap();
        assert_eq!(task.success_count, 0);
    }

    #[tokio::test]
    async fn test_removal_before_the_first_poll_stays_silent() {
        let source = Arc::new(MockListingSource::repeating(vec![candidate("0xcheap", 90)]));
        let notifier = Arc::new(EventNotifier::new());
        let orchestrator =
            PurchaseOrchestrator::new(Arc::new(DryRunProtocol::new()), fast_execution());
        let scheduler =
            TaskScheduler::new(Arc::clone(&source), orchestrator, Arc::clone(&notifier));
        let mut events = capture(&notifier);

        scheduler.add_task(spec(100, 1, 200)).await.unwrap();
        scheduler.remove_task(CONTRACT).await.unwrap();

        tokio::time::sleep(Duration::from_millis(450)).await;

        assert!(events.try_recv().is_err());
        assert_eq!(source.fetch_count.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.task_count().await, 0);
    }

    #[tokio::test]
    async fn test_removal_during_an_in_flight_cycle_drops_the_result() {
        let source = Arc::new(MockListingSource::repeating(vec![candidate("0xcheap", 90)]));
        let protocol = Arc::new(GatedProtocol::new());
        let notifier = Arc::new(EventNotifier::new());
        let orchestrator = PurchaseOrchestrator::new(Arc::clone(&protocol), fast_execution());
        let scheduler =
            TaskScheduler::new(Arc::clone(&source), orchestrator, Arc::clone(&notifier));
        let mut events = capture(&notifier);

        scheduler.add_task(spec(100, 1, 10)).await.unwrap();

        // The cycle announced its purchase and is parked inside it
        assert_eq!(next_event(&mut events).await.kind(), "start_buy");

        scheduler.remove_task(CONTRACT).await.unwrap();
        protocol.release.notify_one();

        tokio::time::sleep(Duration::from_millis(300)).await;

        // The purchase ran to completion but its result had nowhere to
        // land; nothing further is published and the loop is not re-armed
        assert_eq!(protocol.inner.submission_count(), 1);
        assert!(events.try_recv().is_err());
        assert_eq!(source.fetch_count.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.task_count().await, 0);
    }

    #[tokio::test]
    async fn test_target_of_two_takes_two_cycles() {
        let source = MockListingSource::repeating(vec![candidate("0xcheap", 90)]);
        let (scheduler, notifier) = dry_run_scheduler(source);
        let mut events = capture(&notifier);

        scheduler.add_task(spec(100, 2, 10)).await.unwrap();

        assert_eq!(next_event(&mut events).await.kind(), "start_buy");
        match next_event(&mut events).await {
            TaskEvent::BuySuccess(e) => assert_eq!(e.success_count, 1),
            other => panic!("expected BuySuccess, got {other:?}"),
        }

        // Not satisfied yet: the task is still visible between cycles
        let task = scheduler.get_task(CONTRACT).await.unwrap();
        assert_eq!(task.success_count, 1);

        assert_eq!(next_event(&mut events).await.kind(), "start_buy");
        match next_event(&mut events).await {
            TaskEvent::BuySuccess(e) => assert_eq!(e.success_count, 2),
            other => panic!("expected BuySuccess, got {other:?}"),
        }
        match next_event(&mut events).await {
            TaskEvent::TaskEnd(e) => {
                assert_eq!(e.success_count, 2);
                assert_eq!(e.target_count, 2);
            }
            other => panic!("expected TaskEnd, got {other:?}"),
        }

        assert!(scheduler.get_task(CONTRACT).await.is_none());
    }

    #[tokio::test]
    async fn test_shutdown_cancels_every_task() {
        let (scheduler, _notifier) = dry_run_scheduler(MockListingSource::scripted(vec![]));

        scheduler.add_task(spec(100, 1, 60_000)).await.unwrap();
        let mut other = spec(100, 1, 60_000);
        other.contract = "0x00000000000000000000000000000000000000ff".to_string();
        scheduler.add_task(other).await.unwrap();

        assert_eq!(scheduler.task_count().await, 2);

        scheduler.shutdown().await;
        assert_eq!(scheduler.task_count().await, 0);
    }
}
