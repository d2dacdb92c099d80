//! Bar-closed orchestrator: the single entry point per completed bar.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::ports::{ChartMarker, SignalMarker, Venue};
use crate::config::{EngineConfig, RiskParameters};
use crate::domain::{Bar, OrderRequest, PositionId, TradeDirection};
use crate::error::{DispatchAction, EngineError};
use crate::notify::{deliver, Notifier, PositionClosed};
use crate::reconcile::{reconcile, DispatchPlan, ExposurePolicy, Scope};
use crate::signal::{Signal, SignalEvaluator};
use crate::sizers::{SizingInputs, SizingProtocol};
use crate::snapshot::SnapshotProvider;
use crate::stops::reference_price;

/// What one cycle did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub bar_time: DateTime<Utc>,
    pub signal: Signal,
    pub closed: Vec<PositionId>,
    pub order: Option<OrderRequest>,
    pub opened: Option<PositionId>,
    pub marker: Option<SignalMarker>,
}

impl CycleReport {
    fn new(bar_time: DateTime<Utc>, signal: Signal) -> Self {
        Self {
            bar_time,
            signal,
            closed: Vec::new(),
            order: None,
            opened: None,
            marker: None,
        }
    }
}

/// A cycle's report together with the failure that ended it, if any.
#[derive(Debug)]
pub struct CycleOutcome {
    pub report: CycleReport,
    pub error: Option<EngineError>,
}

impl CycleOutcome {
    pub fn into_result(self) -> Result<CycleReport, EngineError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.report),
        }
    }
}

/// Runs signal → reconcile → close → size → submit for one instrument.
///
/// Holds only immutable configuration; all market and account state comes in
/// through the arguments of [`BarClosedOrchestrator::on_bar_closed`].
#[derive(Debug, Clone)]
pub struct BarClosedOrchestrator {
    evaluator: SignalEvaluator,
    sizing: SizingProtocol,
    exposure: ExposurePolicy,
    risk: RiskParameters,
    symbol: String,
    label: Option<String>,
    atr_key: String,
}

impl BarClosedOrchestrator {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            evaluator: SignalEvaluator::from_config(config),
            sizing: config.strategy.sizing,
            exposure: config.strategy.exposure,
            risk: config.risk.clone(),
            symbol: config.instrument.symbol.clone(),
            label: config.strategy.label.clone(),
            atr_key: config.indicators.keys().atr,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn evaluator(&self) -> &SignalEvaluator {
        &self.evaluator
    }

    /// Run one cycle. Every failure ends the cycle and is returned after
    /// being logged; nothing is retried until the next bar.
    pub fn on_bar_closed(
        &self,
        bar_count: usize,
        bar: &Bar,
        snapshot: &dyn SnapshotProvider,
        venue: &mut dyn Venue,
        chart: &mut dyn ChartMarker,
    ) -> Result<CycleReport, EngineError> {
        self.cycle(bar_count, bar, snapshot, venue, chart).into_result()
    }

    /// Like [`on_bar_closed`](Self::on_bar_closed), but keeps what the cycle
    /// did before it failed. A reversal close that went through stays in
    /// the report even when the open after it is refused.
    pub fn cycle(
        &self,
        bar_count: usize,
        bar: &Bar,
        snapshot: &dyn SnapshotProvider,
        venue: &mut dyn Venue,
        chart: &mut dyn ChartMarker,
    ) -> CycleOutcome {
        let mut report = CycleReport::new(bar.open_time, Signal::None);
        let error = self
            .run_cycle(bar_count, bar, snapshot, venue, chart, &mut report)
            .err();
        if let Some(err) = &error {
            match err {
                EngineError::DispatchFailure { .. } => {
                    error!(bar_time = %bar.open_time, kind = err.kind(), closed = report.closed.len(), error = %err, "cycle aborted")
                }
                _ => {
                    warn!(bar_time = %bar.open_time, kind = err.kind(), closed = report.closed.len(), error = %err, "cycle aborted")
                }
            }
        }
        CycleOutcome { report, error }
    }

    /// Forward a position-closed event; failures are logged and dropped.
    pub fn on_position_closed(&self, event: &PositionClosed, notifier: &dyn Notifier) -> bool {
        deliver(notifier, event)
    }

    fn run_cycle(
        &self,
        bar_count: usize,
        bar: &Bar,
        snapshot: &dyn SnapshotProvider,
        venue: &mut dyn Venue,
        chart: &mut dyn ChartMarker,
        report: &mut CycleReport,
    ) -> Result<(), EngineError> {
        let signal = self.evaluator.evaluate(snapshot)?;
        report.signal = signal;
        if signal.is_none() {
            debug!(bar_time = %bar.open_time, rule = self.evaluator.name(), "no signal");
            return Ok(());
        }

        let positions = venue.open_positions(&self.symbol);
        let scope = Scope {
            symbol: &self.symbol,
            label: self.label.as_deref(),
            exposure: self.exposure,
        };
        let plan = reconcile(signal, &positions, &self.risk, scope);
        debug!(
            bar_time = %bar.open_time,
            %signal,
            open_positions = positions.len(),
            closes = plan.closes.len(),
            open = ?plan.open,
            marker = ?plan.marker,
            "reconciled"
        );

        // Read before any close so a missing value leaves the book untouched.
        let volatility = match plan.open {
            Some(_) => Some(snapshot.latest(&self.atr_key)?),
            None => None,
        };

        self.close_reversed(&plan, venue, report)?;

        if let Some(direction) = plan.marker {
            let quote = venue
                .quote(&self.symbol)
                .map_err(|e| EngineError::dispatch(DispatchAction::Query, e))?;
            let marker = SignalMarker::new(
                direction,
                bar_count,
                bar.open_time,
                reference_price(direction, &quote),
            );
            info!(name = %marker.name, price = marker.price, "signal marked, trading disabled");
            chart.mark(marker.clone());
            report.marker = Some(marker);
        }

        if let (Some(direction), Some(volatility)) = (plan.open, volatility) {
            let (order, id) = self.open(direction, volatility, venue)?;
            report.order = Some(order);
            report.opened = Some(id);
        }

        Ok(())
    }

    fn close_reversed(
        &self,
        plan: &DispatchPlan,
        venue: &mut dyn Venue,
        report: &mut CycleReport,
    ) -> Result<(), EngineError> {
        for position in &plan.closes {
            venue
                .close(position)
                .map_err(|e| EngineError::dispatch(DispatchAction::Close(position.id), e))?;
            info!(
                position = %position.id,
                direction = %position.direction,
                volume = position.volume,
                "closed on reversal"
            );
            report.closed.push(position.id);
        }
        Ok(())
    }

    fn open(
        &self,
        direction: TradeDirection,
        volatility: f64,
        venue: &mut dyn Venue,
    ) -> Result<(OrderRequest, PositionId), EngineError> {
        let query = |e| EngineError::dispatch(DispatchAction::Query, e);
        let instrument = venue.instrument(&self.symbol).map_err(query)?;
        let quote = venue.quote(&self.symbol).map_err(query)?;

        let inputs = SizingInputs {
            direction,
            quote,
            volatility,
            equity: venue.balance(),
        };
        let sized = self.sizing.size_order(&inputs, &instrument, &self.risk)?;
        let label = self
            .label
            .clone()
            .unwrap_or_else(|| direction.to_string());
        let request = sized.into_request(&self.symbol, direction, label);

        let id = venue
            .submit(&request)
            .map_err(|e| EngineError::dispatch(DispatchAction::Open(direction), e))?;
        info!(
            position = %id,
            direction = %direction,
            volume = request.volume,
            stop = ?request.stop,
            target = ?request.target,
            sizing = self.sizing.name(),
            "order submitted"
        );
        Ok((request, id))
    }
}
