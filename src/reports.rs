use crate::error::{PayrollError, PayrollResult};
use crate::types::{
    GroupKey, PayrollRecord, PivotRow, PivotView, RunSummary, TotalRow, TotalsView, ViewKind,
    ViewSize, Views,
};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

fn add_to(acc: &mut Decimal, value: Decimal, scope: &'static str) -> PayrollResult<()> {
    *acc = acc
        .checked_add(value)
        .ok_or(PayrollError::Overflow { scope })?;
    Ok(())
}

fn sum_by_group(kind: ViewKind, data: &[PayrollRecord]) -> PayrollResult<TotalsView> {
    let mut map: BTreeMap<GroupKey, Decimal> = BTreeMap::new();
    for r in data {
        add_to(
            map.entry(kind.group_key(r)).or_insert(Decimal::ZERO),
            r.valor_evento,
            kind.sheet_name(),
        )?;
    }
    let rows: Vec<TotalRow> = map
        .into_iter()
        .map(|(key, total)| TotalRow { key, total })
        .collect();
    debug!(sheet = kind.sheet_name(), rows = rows.len(), "view aggregated");
    Ok(TotalsView { kind, rows })
}

/// View 1: Vínculo + Organograma + Fonte, one column per `P/D/PATRONAL` value.
///
/// Every group that exists gets a value for every pivot column; combinations
/// never seen are zero. Groups never seen do not appear at all.
pub fn vinculo_organograma_fonte(data: &[PayrollRecord]) -> PayrollResult<PivotView> {
    let kind = ViewKind::VinculoOrganogramaFonte;
    let pivot_columns: BTreeSet<&str> = data.iter().map(|r| r.pd_patronal.as_str()).collect();

    let mut map: BTreeMap<GroupKey, BTreeMap<String, Decimal>> = BTreeMap::new();
    for r in data {
        let values = map.entry(kind.group_key(r)).or_insert_with(|| {
            pivot_columns
                .iter()
                .map(|c| (c.to_string(), Decimal::ZERO))
                .collect()
        });
        add_to(
            values.entry(r.pd_patronal.clone()).or_insert(Decimal::ZERO),
            r.valor_evento,
            kind.sheet_name(),
        )?;
    }

    let rows: Vec<PivotRow> = map
        .into_iter()
        .map(|(key, values)| PivotRow { key, values })
        .collect();
    debug!(
        sheet = kind.sheet_name(),
        rows = rows.len(),
        columns = pivot_columns.len(),
        "view aggregated"
    );
    Ok(PivotView {
        kind,
        pivot_columns: pivot_columns.into_iter().map(str::to_string).collect(),
        rows,
    })
}

/// View 2: Vínculo + Evento + Fonte.
pub fn vinculo_evento_fonte(data: &[PayrollRecord]) -> PayrollResult<TotalsView> {
    sum_by_group(ViewKind::VinculoEventoFonte, data)
}

/// View 3: Vínculo + Organograma + Fonte, single total column.
pub fn totais_organograma_fonte(data: &[PayrollRecord]) -> PayrollResult<TotalsView> {
    sum_by_group(ViewKind::TotaisOrganogramaFonte, data)
}

/// View 4: Organograma + Evento + Fonte.
pub fn organograma_evento_fonte(data: &[PayrollRecord]) -> PayrollResult<TotalsView> {
    sum_by_group(ViewKind::OrganogramaEventoFonte, data)
}

pub fn build_views(data: &[PayrollRecord]) -> PayrollResult<Views> {
    Ok(Views {
        vinculo_organograma_fonte: vinculo_organograma_fonte(data)?,
        vinculo_evento_fonte: vinculo_evento_fonte(data)?,
        totais_organograma_fonte: totais_organograma_fonte(data)?,
        organograma_evento_fonte: organograma_evento_fonte(data)?,
    })
}

pub fn summarize(data: &[PayrollRecord], views: &Views) -> PayrollResult<RunSummary> {
    let fontes: HashSet<&str> = data.iter().map(|r| r.fonte_de_recurso.as_str()).collect();
    let mut grand_total = Decimal::ZERO;
    for r in data {
        add_to(&mut grand_total, r.valor_evento, "grand total")?;
    }
    let sizes = [
        (ViewKind::VinculoOrganogramaFonte, views.vinculo_organograma_fonte.rows.len()),
        (ViewKind::VinculoEventoFonte, views.vinculo_evento_fonte.rows.len()),
        (ViewKind::TotaisOrganogramaFonte, views.totais_organograma_fonte.rows.len()),
        (ViewKind::OrganogramaEventoFonte, views.organograma_evento_fonte.rows.len()),
    ];
    Ok(RunSummary {
        total_records: data.len(),
        grand_total,
        distinct_fontes: fontes.len(),
        pivot_columns: views.vinculo_organograma_fonte.pivot_columns.clone(),
        views: sizes
            .into_iter()
            .map(|(kind, rows)| ViewSize {
                sheet: kind.sheet_name(),
                rows,
            })
            .collect(),
    })
}
