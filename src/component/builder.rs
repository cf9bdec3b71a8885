//! Component builder - runs selected components in order and times them.
//!
//! Components run one at a time in the fixed order of `definitions::ALL`.
//! The first failure stops the run; components after it are not attempted.

use tracing::error;

use super::executor::{self, BuildContext};
use super::Component;
use crate::timing::{Outcome, Timer, Times};

/// What happened during a run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Times for every attempted component, including a failed one.
    pub times: Times,
    /// The component that stopped the run and why.
    pub failure: Option<(&'static str, anyhow::Error)>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

/// Pick components from `all`, keeping its order.
///
/// `build_all` selects everything; otherwise a component is selected when
/// its name is in `names`. Unknown names are ignored.
pub fn select<S: AsRef<str>>(
    all: &[&'static Component],
    build_all: bool,
    names: &[S],
) -> Vec<&'static Component> {
    all.iter()
        .copied()
        .filter(|c| build_all || names.iter().any(|n| n.as_ref() == c.name))
        .collect()
}

/// Build one component, timing it whether it succeeds or not.
pub fn build_component(ctx: &BuildContext, component: &Component) -> Outcome {
    let timer = Timer::start(component.name);
    timer.finish(executor::execute(ctx, component))
}

/// Build `components` in order, stopping at the first failure.
pub fn build_components(ctx: &BuildContext, components: &[&'static Component]) -> RunReport {
    let mut report = RunReport::default();

    for &component in components {
        let outcome = build_component(ctx, component);
        report.times.record(component.name, &outcome);

        if let Outcome::Failed { cause, .. } = outcome {
            error!("{} failed: {:#}", component.name, cause);
            report.failure = Some((component.name, cause));
            break;
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::definitions::ALL;

    #[test]
    fn test_select_keeps_definition_order() {
        let selected = select(ALL, false, &["nginx", "tinc"]);
        let names: Vec<_> = selected.iter().map(|c| c.name).collect();
        assert_eq!(names, ["tinc", "nginx"]);
    }

    #[test]
    fn test_select_all() {
        assert_eq!(select::<&str>(ALL, true, &[]).len(), ALL.len());
    }

    #[test]
    fn test_select_nothing() {
        assert!(select::<&str>(ALL, false, &[]).is_empty());
        assert!(select(ALL, false, &["redis"]).is_empty());
    }
}
