//! Single control pass
//!
//! Order within a pass is fixed: charger status, readiness gate, telemetry,
//! allocation, one charger write. Once the gate has passed, any failure is
//! followed by exactly one disable so the charger is never left running
//! without confirmed surplus data.

use crate::charger::{
    ChargerClient, ChargerStatus, Readiness, ReadinessGate, StopReason, WriteOutcome,
};
use crate::config::Config;
use crate::controls::{
    AllocationDecision, AllocationPolicy, CandidateTable, ChargerSetting, PolicyContext,
    build_policy,
};
use crate::error::Result;
use crate::logging::get_logger;
use crate::persistence::FileTokenStore;
use crate::viessmann::{IdentityClient, TelemetryClient};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Duration;

/// How a pass ended
#[derive(Debug, Clone, PartialEq)]
pub enum PassOutcome {
    /// Gate said stop; nothing was written
    Skipped(StopReason),
    /// Decision made and written (or already in place)
    Applied {
        decision: AllocationDecision,
        write: WriteOutcome,
    },
    /// Pass failed; the message is the first error seen
    Aborted(String),
}

impl PassOutcome {
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }
}

pub struct Controller {
    charger: ChargerClient,
    telemetry: TelemetryClient,
    gate: ReadinessGate,
    policy: Box<dyn AllocationPolicy>,
    tz: Tz,
    logger: crate::logging::StructuredLogger,
}

impl Controller {
    pub fn new(
        charger: ChargerClient,
        telemetry: TelemetryClient,
        policy: Box<dyn AllocationPolicy>,
        tz: Tz,
    ) -> Self {
        Self {
            charger,
            telemetry,
            gate: ReadinessGate::new(),
            policy,
            tz,
            logger: get_logger("controller"),
        }
    }

    /// Wire every collaborator from a validated configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = Duration::from_secs(config.http_timeout_secs);
        let store = Arc::new(FileTokenStore::new(&config.token_file));
        let identity = IdentityClient::new(config.viessmann.iam.clone(), store, timeout)?;
        let telemetry = TelemetryClient::new(config.viessmann.iot.clone(), identity, timeout)?;
        let charger = ChargerClient::new(&config.charger, timeout)?;
        let table = CandidateTable::from_config(&config.charger)?;
        let policy = build_policy(&config.policy, table);
        Ok(Self::new(charger, telemetry, policy, config.tz()?))
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    pub async fn run_once(&self) -> PassOutcome {
        self.run_once_at(Utc::now()).await
    }

    /// One pass evaluated at `now`; errors end up in the outcome
    pub async fn run_once_at(&self, now: DateTime<Utc>) -> PassOutcome {
        let status = match self.charger.status().await {
            Ok(status) => status,
            Err(e) => {
                self.logger
                    .error(&format!("Charger status unavailable, aborting pass: {}", e));
                return PassOutcome::Aborted(e.to_string());
            }
        };

        if let Readiness::Stop(reason) = self.gate.check(&status) {
            return PassOutcome::Skipped(reason);
        }

        let decision = match self.decide(&status, now).await {
            Ok(decision) => decision,
            Err(e) => {
                self.logger.error(&format!("Pass failed after readiness check: {}", e));
                self.fail_safe(&status).await;
                return PassOutcome::Aborted(e.to_string());
            }
        };

        match self
            .charger
            .write(&status, &decision.setting.setpoint())
            .await
        {
            Ok(write) => PassOutcome::Applied { decision, write },
            Err(e) => {
                self.logger
                    .error(&format!("Failed to apply {}: {}", decision.setting, e));
                // A failed disable is not retried
                if decision.setting != ChargerSetting::Disable {
                    self.fail_safe(&status).await;
                }
                PassOutcome::Aborted(e.to_string())
            }
        }
    }

    async fn decide(
        &self,
        status: &ChargerStatus,
        now: DateTime<Utc>,
    ) -> Result<AllocationDecision> {
        let pv = self.telemetry.fetch().await?;
        let ctx = PolicyContext::at(now, &self.tz);
        let decision = self.policy.compute_setting(&pv, status, &ctx)?;
        self.logger.info(&format!(
            "Policy {}: available {:.0} W at hour {} -> {}",
            self.policy.name(),
            decision.available_power_w,
            ctx.local_hour,
            decision.setting
        ));
        Ok(decision)
    }

    async fn fail_safe(&self, status: &ChargerStatus) {
        match self.charger.disable(status).await {
            Ok(_) => self.logger.warn("Charger disabled as fail-safe"),
            Err(e) => self
                .logger
                .error(&format!("Fail-safe disable failed: {}", e)),
        }
    }
}
