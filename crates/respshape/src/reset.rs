//! Best-effort teardown of the demo assets.
//!
//! Every step is attempted in order, whatever happened to the previous one.
//! Failures are logged and recorded in the [`ResetReport`], never returned.

use std::fmt;
use std::future::Future;

use log::{info, warn};
use respshape_client::ManagementApi;
use respshape_common::discriminators::{self, DEVELOPER, DEVELOPER_APP_COUNT, PRODUCT, PROXY};

use crate::error::{ProvisionError, Result};

/// One reset step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetStep {
    DeleteApp(u8),
    DeleteDeveloper,
    DeleteProduct,
    /// Get proxy, fetch deployments, undeploy the first one.
    ProxyTeardown,
    /// Delete the proxy definition; only attempted after a successful undeploy.
    DeleteProxy,
}

impl fmt::Display for ResetStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeleteApp(index) => write!(
                f,
                "delete developer app {}",
                discriminators::developer_app_name(*index)
            ),
            Self::DeleteDeveloper => write!(f, "delete developer {DEVELOPER}"),
            Self::DeleteProduct => write!(f, "delete product {PRODUCT}"),
            Self::ProxyTeardown => write!(f, "undeploy proxy {PROXY}"),
            Self::DeleteProxy => write!(f, "delete proxy {PROXY}"),
        }
    }
}

/// Outcome of one attempted step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub step: ResetStep,
    /// The logged failure message, if the step failed.
    pub error: Option<String>,
}

impl StepOutcome {
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Logged once every step has been attempted.
pub const COMPLETION_MESSAGE: &str = "ok. demo assets have been deleted";

/// What a reset run attempted, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResetReport {
    pub steps: Vec<StepOutcome>,
    /// Set when the completion message was logged.
    pub completed: bool,
}

impl ResetReport {
    /// Outcome of `step`, if it was attempted.
    #[must_use]
    pub fn outcome(&self, step: ResetStep) -> Option<&StepOutcome> {
        self.steps.iter().find(|o| o.step == step)
    }

    #[must_use]
    pub fn attempted(&self, step: ResetStep) -> bool {
        self.outcome(step).is_some()
    }

    #[must_use]
    pub fn succeeded(&self, step: ResetStep) -> bool {
        self.outcome(step).is_some_and(StepOutcome::succeeded)
    }

    #[must_use]
    pub fn failures(&self) -> usize {
        self.steps.iter().filter(|o| !o.succeeded()).count()
    }

    fn push<T, E: fmt::Display>(&mut self, step: ResetStep, result: &std::result::Result<T, E>) {
        self.steps.push(StepOutcome {
            step,
            error: result.as_ref().err().map(ToString::to_string),
        });
    }
}

/// Awaits `op` and logs a failure at warn instead of returning it.
pub async fn best_effort<T, E, F>(step: ResetStep, op: F) -> std::result::Result<T, E>
where
    E: fmt::Display,
    F: Future<Output = std::result::Result<T, E>>,
{
    let result = op.await;
    if let Err(e) = &result {
        warn!("{step} failed: {e}");
    }
    result
}

/// Deletes apps, developer, product and proxy.
pub struct ResetOrchestrator<'a> {
    api: &'a dyn ManagementApi,
}

impl<'a> ResetOrchestrator<'a> {
    #[must_use]
    pub fn new(api: &'a dyn ManagementApi) -> Self {
        Self { api }
    }

    /// Runs every step and reports how each went.
    pub async fn run(&self) -> ResetReport {
        let mut report = ResetReport::default();

        for index in 1..=DEVELOPER_APP_COUNT {
            let name = discriminators::developer_app_name(index);
            let step = ResetStep::DeleteApp(index);
            let result = best_effort(step, self.api.delete_developer_app(DEVELOPER, &name)).await;
            report.push(step, &result);
        }

        let result = best_effort(
            ResetStep::DeleteDeveloper,
            self.api.delete_developer(DEVELOPER),
        )
        .await;
        report.push(ResetStep::DeleteDeveloper, &result);

        let result = best_effort(ResetStep::DeleteProduct, self.api.delete_product(PRODUCT)).await;
        report.push(ResetStep::DeleteProduct, &result);

        let result = best_effort(ResetStep::ProxyTeardown, self.undeploy_proxy()).await;
        report.push(ResetStep::ProxyTeardown, &result);

        // The definition is only deleted once an undeploy went through.
        if let Ok(name) = result {
            let result = best_effort(ResetStep::DeleteProxy, self.api.delete_proxy(&name)).await;
            report.push(ResetStep::DeleteProxy, &result);
        }

        info!("{COMPLETION_MESSAGE}");
        report.completed = true;
        report
    }

    /// Undeploys the first listed deployment and returns the proxy name.
    async fn undeploy_proxy(&self) -> Result<String> {
        let proxy = self.api.get_proxy(PROXY).await?;
        let deployments = self.api.get_proxy_deployments(&proxy.name).await?;
        let (environment, revision) = deployments
            .first()
            .ok_or_else(|| ProvisionError::NoDeployment(proxy.name.clone()))?;

        self.api
            .undeploy_proxy(environment, &proxy.name, revision)
            .await?;
        info!("Undeployed {} revision {revision} from {environment}", proxy.name);
        Ok(proxy.name)
    }
}
