use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

pub const ORGANOGRAMA: &str = "ORGANOGRAMA";
pub const DESCRICAO_ORGANOGRAMA: &str = "DESCRIÇÃO DO ORGANOGRAMA";
pub const EVENTO: &str = "EVENTO";
pub const DESCRICAO_EVENTO: &str = "DESCRIÇÃO DO EVENTO";
pub const PD_PATRONAL: &str = "P/D/PATRONAL";
pub const VINCULO: &str = "VÍNCULO";
pub const DESCRICAO_VINCULO: &str = "DESCRIÇÃO DO VÍNCULO";
pub const VALOR_EVENTO: &str = "VALOR DO EVENTO";
pub const FONTE_DE_RECURSO: &str = "FONTE DE RECURSO";

/// Required input columns, by normalized name, in the order they are checked.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    ORGANOGRAMA,
    DESCRICAO_ORGANOGRAMA,
    EVENTO,
    DESCRICAO_EVENTO,
    PD_PATRONAL,
    VINCULO,
    DESCRICAO_VINCULO,
    VALOR_EVENTO,
];

/// One validated payroll line.
///
/// Only the loader builds these, so every record carries all eight required
/// fields and a `fonte_de_recurso` derived from `organograma`.
#[derive(Debug, Clone, PartialEq)]
pub struct PayrollRecord {
    pub organograma: String,
    pub descricao_organograma: String,
    pub evento: String,
    pub descricao_evento: String,
    pub pd_patronal: String,
    pub vinculo: String,
    pub descricao_vinculo: String,
    pub valor_evento: Decimal,
    pub fonte_de_recurso: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub blank_rows: usize,
    pub columns: usize,
}

/// Grouping key of a view. Derived `Ord` compares the three parts in order,
/// which is the row order of every view.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey(pub String, pub String, pub String);

impl GroupKey {
    pub fn parts(&self) -> [&str; 3] {
        [&self.0, &self.1, &self.2]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    VinculoOrganogramaFonte,
    VinculoEventoFonte,
    TotaisOrganogramaFonte,
    OrganogramaEventoFonte,
}

impl ViewKind {
    pub const ALL: [ViewKind; 4] = [
        ViewKind::VinculoOrganogramaFonte,
        ViewKind::VinculoEventoFonte,
        ViewKind::TotaisOrganogramaFonte,
        ViewKind::OrganogramaEventoFonte,
    ];

    pub fn sheet_name(self) -> &'static str {
        match self {
            ViewKind::VinculoOrganogramaFonte => "Vinculo_Organograma_Fonte",
            ViewKind::VinculoEventoFonte => "Vinculo_Evento_Fonte",
            ViewKind::TotaisOrganogramaFonte => "Totais_Organograma_Fonte",
            ViewKind::OrganogramaEventoFonte => "Organograma_Evento_Fonte",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ViewKind::VinculoOrganogramaFonte => "Vínculo + Organograma + Fonte",
            ViewKind::VinculoEventoFonte => "Vínculo + Evento + Fonte",
            ViewKind::TotaisOrganogramaFonte => "Vínculo + Organograma + Fonte (Totais)",
            ViewKind::OrganogramaEventoFonte => "Organograma + Evento + Fonte",
        }
    }

    pub fn key_columns(self) -> [&'static str; 3] {
        match self {
            ViewKind::VinculoOrganogramaFonte | ViewKind::TotaisOrganogramaFonte => {
                [DESCRICAO_VINCULO, DESCRICAO_ORGANOGRAMA, FONTE_DE_RECURSO]
            }
            ViewKind::VinculoEventoFonte => [DESCRICAO_VINCULO, DESCRICAO_EVENTO, FONTE_DE_RECURSO],
            ViewKind::OrganogramaEventoFonte => {
                [DESCRICAO_ORGANOGRAMA, DESCRICAO_EVENTO, FONTE_DE_RECURSO]
            }
        }
    }

    pub fn group_key(self, r: &PayrollRecord) -> GroupKey {
        let (a, b) = match self {
            ViewKind::VinculoOrganogramaFonte | ViewKind::TotaisOrganogramaFonte => {
                (&r.descricao_vinculo, &r.descricao_organograma)
            }
            ViewKind::VinculoEventoFonte => (&r.descricao_vinculo, &r.descricao_evento),
            ViewKind::OrganogramaEventoFonte => (&r.descricao_organograma, &r.descricao_evento),
        };
        GroupKey(a.clone(), b.clone(), r.fonte_de_recurso.clone())
    }
}

/// View 1: sums split by `P/D/PATRONAL`, one column per value seen in the data.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotView {
    pub kind: ViewKind,
    pub pivot_columns: Vec<String>,
    pub rows: Vec<PivotRow>,
}

/// `values` holds an entry for every pivot column, zero where the group had
/// no lines of that kind.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotRow {
    pub key: GroupKey,
    pub values: BTreeMap<String, Decimal>,
}

impl PivotRow {
    pub fn total(&self) -> Decimal {
        self.values.values().copied().sum()
    }
}

/// Views 2-4: a single summed column.
#[derive(Debug, Clone, PartialEq)]
pub struct TotalsView {
    pub kind: ViewKind,
    pub rows: Vec<TotalRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TotalRow {
    pub key: GroupKey,
    pub total: Decimal,
}

impl TotalsView {
    pub fn grand_total(&self) -> Decimal {
        self.rows.iter().map(|r| r.total).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Views {
    pub vinculo_organograma_fonte: PivotView,
    pub vinculo_evento_fonte: TotalsView,
    pub totais_organograma_fonte: TotalsView,
    pub organograma_evento_fonte: TotalsView,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ViewSize {
    pub sheet: &'static str,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunSummary {
    pub total_records: usize,
    pub grand_total: Decimal,
    pub distinct_fontes: usize,
    pub pivot_columns: Vec<String>,
    pub views: Vec<ViewSize>,
}
