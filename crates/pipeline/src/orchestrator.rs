//! Railway-style pipeline execution.
//!
//! Stage order is fixed: validate → fetch → combine → score-and-select →
//! report. Each stage takes the run context by value and returns
//! `Result<PipelineContext, PipelineError>`; `and_then` is the only
//! composition between stages, so the first failure halts the rest and is
//! returned unchanged. The orchestrator is stateless between runs: every
//! invocation builds a fresh context.

use gmselect_engine::{SearchCriteria, SelectionConfig, SelectionStrategy};

use crate::combine::combine_tables;
use crate::context::PipelineContext;
use crate::error::PipelineError;
use crate::fetch::{run_fetch, FetchMode};
use crate::report::{build_report, PipelineResult};
use crate::source::DataSource;

/// Run the full pipeline over the given sources.
///
/// Individual source failures are absorbed into the failed-source list as
/// long as at least one source returns data; every other failure is fatal
/// and no partial result is returned.
pub fn run(
    sources: &[&dyn DataSource],
    strategy: &dyn SelectionStrategy,
    criteria: SearchCriteria,
    selection: SelectionConfig,
    mode: FetchMode,
) -> Result<PipelineResult, PipelineError> {
    let context = PipelineContext::new(criteria);

    validate_stage(context)
        .and_then(|ctx| fetch_stage(ctx, sources, mode))
        .and_then(combine_stage)
        .and_then(|ctx| strategy_stage(ctx, strategy, &selection))
        .and_then(|ctx| finalize_stage(ctx, strategy, &selection, sources))
}

/// Like [`run`], resolving the strategy from the selection config's design
/// code first. An unknown code fails before any stage executes.
pub fn run_with_design_code(
    sources: &[&dyn DataSource],
    criteria: SearchCriteria,
    selection: SelectionConfig,
    mode: FetchMode,
) -> Result<PipelineResult, PipelineError> {
    let strategy = gmselect_engine::for_design_code(&selection.design_code)
        .map_err(|e| PipelineError::Configuration(e.to_string()))?;
    run(sources, strategy.as_ref(), criteria, selection, mode)
}

fn validate_stage(mut ctx: PipelineContext) -> Result<PipelineContext, PipelineError> {
    ctx.criteria.validate().map_err(PipelineError::Validation)?;
    ctx.log("criteria validated");
    Ok(ctx)
}

fn fetch_stage(
    mut ctx: PipelineContext,
    sources: &[&dyn DataSource],
    mode: FetchMode,
) -> Result<PipelineContext, PipelineError> {
    let outcomes = run_fetch(sources, &ctx.criteria, mode);

    for outcome in outcomes {
        match outcome.result {
            Ok(table) => {
                ctx.log(format!(
                    "[OK] {} returned {} records",
                    outcome.source,
                    table.n_rows()
                ));
                ctx.tables.push(table);
            }
            Err(err) => {
                ctx.log(format!("[ERROR] {err}"));
                ctx.failed_sources.push(outcome.source);
            }
        }
    }

    if ctx.tables.is_empty() {
        return Err(PipelineError::NoData(
            "no data received from any source".into(),
        ));
    }
    Ok(ctx)
}

fn combine_stage(mut ctx: PipelineContext) -> Result<PipelineContext, PipelineError> {
    let tables = std::mem::take(&mut ctx.tables);
    let source_count = tables.len();
    let combined = combine_tables(tables)?;
    ctx.log(format!(
        "combined {} source tables, total {} records",
        source_count,
        combined.n_rows()
    ));
    ctx.combined = Some(combined);
    Ok(ctx)
}

fn strategy_stage(
    mut ctx: PipelineContext,
    strategy: &dyn SelectionStrategy,
    selection: &SelectionConfig,
) -> Result<PipelineContext, PipelineError> {
    let combined = ctx
        .combined
        .take()
        .ok_or_else(|| PipelineError::NoData("no combined table to score".into()))?;

    let (selected, scored) = strategy
        .select_and_score(&combined, &ctx.criteria, selection)
        .map_err(PipelineError::Strategy)?;

    ctx.log(format!("strategy applied: {}", strategy.name()));
    ctx.combined = Some(combined);
    ctx.selected = Some(selected);
    ctx.scored = Some(scored);
    Ok(ctx)
}

fn finalize_stage(
    mut ctx: PipelineContext,
    strategy: &dyn SelectionStrategy,
    selection: &SelectionConfig,
    sources: &[&dyn DataSource],
) -> Result<PipelineResult, PipelineError> {
    let (selected, scored) = match (ctx.selected.take(), ctx.scored.take()) {
        (Some(selected), Some(scored)) => (selected, scored),
        _ => {
            return Err(PipelineError::NoData(
                "no scored data available for the result".into(),
            ))
        }
    };

    let execution_time = ctx.started.elapsed().as_secs_f64();
    ctx.log(format!("execution time: {execution_time:.2} sec"));

    let source_names: Vec<String> = sources.iter().map(|s| s.identity().to_string()).collect();
    let report = build_report(
        &selected,
        &scored,
        &ctx.criteria,
        selection,
        strategy.name(),
        &source_names,
    );

    Ok(PipelineResult {
        selected,
        scored,
        report,
        execution_time,
        failed_sources: ctx.failed_sources,
        logs: ctx.logs,
    })
}
