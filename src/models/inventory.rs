// src/models/inventory.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::common::error::AppError;

/// Armazém usado quando o chamador não informa nenhum.
pub const DEFAULT_WAREHOUSE: &str = "MSK";

/// Normaliza o código do armazém: trim + maiúsculas, "MSK" se vier vazio.
pub fn normalize_warehouse_code(code: Option<&str>) -> String {
    match code.map(str::trim) {
        Some(c) if !c.is_empty() => c.to_uppercase(),
        _ => DEFAULT_WAREHOUSE.to_string(),
    }
}

// --- 1. Armazéns ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Warehouse {
    pub id: i64,
    #[schema(example = "MSK")]
    pub code: String,
    #[schema(example = "Moscow main")]
    pub name: String,
    pub created_at: DateTime<Utc>,
}

// --- 2. Saldo por (armazém, produto) ---
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockRecord {
    pub id: i64,
    pub warehouse: String,
    pub product_id: i64,
    /// Disponível (não comprometido com pedidos)
    pub qty: i32,
    /// Comprometido com pedidos confirmados, ainda não expedido
    pub reserved_qty: i32,
    /// Prometido via produção, ainda não fisicamente disponível
    pub on_order_qty: i32,
    pub updated_at: DateTime<Utc>,
}

// --- 3. Movimentações (diário append-only) ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "stock_movement_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    In,
    Out,
    Reserve,
    Unreserve,
    Adjust,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: i64,
    pub warehouse: String,
    pub product_id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    /// Magnitude (> 0). Para `adjust` é o valor pedido, com sinal.
    pub qty: i32,
    pub order_id: Option<i64>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// O que uma mutação de saldo precisa gravar no diário.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementDraft {
    pub movement_type: MovementType,
    pub qty: i32,
}

impl MovementDraft {
    fn new(movement_type: MovementType, qty: i32) -> Self {
        Self { movement_type, qty }
    }
}

/// Linha a ser anexada ao diário.
#[derive(Debug, Clone)]
pub struct NewMovement<'a> {
    pub warehouse: &'a str,
    pub product_id: i64,
    pub draft: MovementDraft,
    pub order_id: Option<i64>,
    pub note: Option<&'a str>,
}

pub const DEFAULT_MOVEMENT_LIMIT: i64 = 100;
pub const MAX_MOVEMENT_LIMIT: i64 = 1000;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovementFilter {
    pub warehouse: Option<String>,
    pub product_id: Option<i64>,
    pub order_id: Option<i64>,
    pub limit: i64,
}

impl MovementFilter {
    pub fn new(warehouse: Option<&str>, product_id: Option<i64>, order_id: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            // Aqui o armazém é filtro, não default: vazio = todos.
            warehouse: warehouse
                .map(str::trim)
                .filter(|w| !w.is_empty())
                .map(str::to_uppercase),
            product_id,
            order_id,
            limit: limit.unwrap_or(DEFAULT_MOVEMENT_LIMIT).clamp(1, MAX_MOVEMENT_LIMIT),
        }
    }
}

/// Resultado de tentar reservar `requested` contra o disponível.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservationPlan {
    pub requested: i32,
    pub can_reserve: i32,
    pub missing: i32,
}

impl ReservationPlan {
    pub fn new(available: i32, requested: i32) -> Self {
        let requested = requested.max(0);
        let can_reserve = available.max(0).min(requested);
        Self {
            requested,
            can_reserve,
            missing: requested - can_reserve,
        }
    }
}

fn ensure_positive(qty: i32) -> Result<(), AppError> {
    if qty <= 0 {
        return Err(AppError::NonPositiveQuantity);
    }
    Ok(())
}

fn checked_sum(current: i32, qty: i32) -> Result<i32, AppError> {
    current.checked_add(qty).ok_or(AppError::QuantityOverflow)
}

// Transições puras de saldo. Cada uma devolve o movimento a registrar;
// quem persiste (StockLedger) grava o registro e o movimento na mesma transação.
impl StockRecord {
    /// Registro novo, com todos os contadores zerados.
    pub fn empty(warehouse: &str, product_id: i64) -> Self {
        Self {
            id: 0,
            warehouse: warehouse.to_string(),
            product_id,
            qty: 0,
            reserved_qty: 0,
            on_order_qty: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn receive(&mut self, qty: i32) -> Result<MovementDraft, AppError> {
        ensure_positive(qty)?;
        self.qty = checked_sum(self.qty, qty)?;
        Ok(MovementDraft::new(MovementType::In, qty))
    }

    /// Baixa com piso em zero (não falha). Quem precisa de garantia checa antes.
    pub fn issue(&mut self, qty: i32) -> Result<MovementDraft, AppError> {
        ensure_positive(qty)?;
        self.qty = (self.qty - qty).max(0);
        Ok(MovementDraft::new(MovementType::Out, qty))
    }

    /// Correção absoluta. O diário guarda o valor pedido, mesmo negativo.
    pub fn adjust(&mut self, absolute_qty: i32) -> MovementDraft {
        self.qty = absolute_qty.max(0);
        MovementDraft::new(MovementType::Adjust, absolute_qty)
    }

    pub fn reserve(&mut self, qty: i32) -> Result<MovementDraft, AppError> {
        ensure_positive(qty)?;
        if self.qty < qty {
            return Err(AppError::NotEnoughStock);
        }
        self.reserved_qty = checked_sum(self.reserved_qty, qty)?;
        self.qty -= qty;
        Ok(MovementDraft::new(MovementType::Reserve, qty))
    }

    pub fn unreserve(&mut self, qty: i32) -> Result<MovementDraft, AppError> {
        ensure_positive(qty)?;
        if self.reserved_qty < qty {
            return Err(AppError::NotEnoughReserved);
        }
        self.qty = checked_sum(self.qty, qty)?;
        self.reserved_qty -= qty;
        Ok(MovementDraft::new(MovementType::Unreserve, qty))
    }

    /// Expedição: consome reserva. Pré-condição dura, não corrige sozinho.
    pub fn ship(&mut self, qty: i32) -> Result<MovementDraft, AppError> {
        ensure_positive(qty)?;
        if self.reserved_qty < qty {
            return Err(AppError::NotEnoughReservedToShip);
        }
        self.reserved_qty -= qty;
        Ok(MovementDraft::new(MovementType::Out, qty))
    }

    /// Produção pronta entrando no estoque: sai do "a caminho", entra no disponível.
    pub fn accept_production(&mut self, qty: i32) -> Result<MovementDraft, AppError> {
        ensure_positive(qty)?;
        self.qty = checked_sum(self.qty, qty)?;
        self.on_order_qty = (self.on_order_qty - qty).max(0);
        Ok(MovementDraft::new(MovementType::In, qty))
    }

    /// Falta encomendada à produção. Não gera movimento (on-order não vai pro diário).
    pub fn backorder(&mut self, qty: i32) -> Result<(), AppError> {
        ensure_positive(qty)?;
        self.on_order_qty = checked_sum(self.on_order_qty, qty)?;
        Ok(())
    }

    pub fn balance(&self) -> StockBalance {
        StockBalance {
            qty: self.qty.into(),
            reserved_qty: self.reserved_qty.into(),
        }
    }
}

/// Comando tipado aplicado a um saldo travado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerOp {
    Receive(i32),
    Issue(i32),
    Adjust(i32),
    Reserve(i32),
    Unreserve(i32),
    Ship(i32),
    AcceptProduction(i32),
    Backorder(i32),
}

impl LedgerOp {
    /// Expedição só consome reserva existente; as demais criam o saldo no primeiro toque.
    pub fn creates_record(&self) -> bool {
        !matches!(self, LedgerOp::Ship(_))
    }

    /// Aplica no registro. `None` = nada a registrar no diário.
    pub fn apply(self, record: &mut StockRecord) -> Result<Option<MovementDraft>, AppError> {
        let draft = match self {
            LedgerOp::Receive(q) => record.receive(q)?,
            LedgerOp::Issue(q) => record.issue(q)?,
            LedgerOp::Adjust(v) => record.adjust(v),
            LedgerOp::Reserve(q) => record.reserve(q)?,
            LedgerOp::Unreserve(q) => record.unreserve(q)?,
            LedgerOp::Ship(q) => record.ship(q)?,
            LedgerOp::AcceptProduction(q) => record.accept_production(q)?,
            LedgerOp::Backorder(q) => {
                record.backorder(q)?;
                return Ok(None);
            }
        };
        Ok(Some(draft))
    }
}

// --- 4. Reconciliação ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockBalance {
    // i64: o replay soma o diário inteiro sem estourar.
    pub qty: i64,
    pub reserved_qty: i64,
}

impl StockBalance {
    /// Aplica um movimento do diário.
    ///
    /// `out` com pedido é expedição (sai da reserva); sem pedido é baixa manual
    /// do disponível, com o mesmo piso em zero do `issue`.
    pub fn apply(&mut self, movement_type: MovementType, qty: i32, order_id: Option<i64>) {
        let qty = i64::from(qty);
        match movement_type {
            MovementType::In => self.qty += qty,
            MovementType::Out if order_id.is_some() => self.reserved_qty -= qty,
            MovementType::Out => self.qty = (self.qty - qty).max(0),
            MovementType::Reserve => {
                self.qty -= qty;
                self.reserved_qty += qty;
            }
            MovementType::Unreserve => {
                self.reserved_qty -= qty;
                self.qty += qty;
            }
            MovementType::Adjust => self.qty = qty.max(0),
        }
    }

    /// Reconstrói o saldo a partir do diário (ordem cronológica).
    pub fn replay<'a>(movements: impl IntoIterator<Item = &'a StockMovement>) -> Self {
        movements.into_iter().fold(Self::default(), |mut acc, m| {
            acc.apply(m.movement_type, m.qty, m.order_id);
            acc
        })
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    pub warehouse: String,
    pub product_id: i64,
    pub recorded: StockBalance,
    pub replayed: StockBalance,
    pub movements: usize,
    pub consistent: bool,
}

impl Reconciliation {
    pub fn new(warehouse: String, product_id: i64, recorded: StockBalance, journal: &[StockMovement]) -> Self {
        let replayed = StockBalance::replay(journal);
        Self {
            warehouse,
            product_id,
            recorded,
            replayed,
            movements: journal.len(),
            consistent: recorded == replayed,
        }
    }
}

/// Reserva ainda em aberto de um pedido numa chave, somada a partir do diário.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct HeldReservation {
    pub warehouse: String,
    pub product_id: i64,
    pub qty: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseStocks {
    pub warehouse: String,
    pub stocks: Vec<StockRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(qty: i32, reserved: i32) -> StockRecord {
        StockRecord {
            qty,
            reserved_qty: reserved,
            ..StockRecord::empty("MSK", 1)
        }
    }

    fn movement(movement_type: MovementType, qty: i32, order_id: Option<i64>) -> StockMovement {
        StockMovement {
            id: 0,
            warehouse: "MSK".into(),
            product_id: 1,
            movement_type,
            qty,
            order_id,
            note: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn warehouse_code_is_trimmed_and_uppercased() {
        assert_eq!(normalize_warehouse_code(Some("  spb ")), "SPB");
        assert_eq!(normalize_warehouse_code(Some("   ")), "MSK");
        assert_eq!(normalize_warehouse_code(None), "MSK");
    }

    #[test]
    fn movement_filter_clamps_limit() {
        let filter = MovementFilter::new(Some(" spb"), None, Some(3), Some(50_000));
        assert_eq!(filter.warehouse.as_deref(), Some("SPB"));
        assert_eq!(filter.limit, MAX_MOVEMENT_LIMIT);
        assert_eq!(MovementFilter::new(Some(""), None, None, None).warehouse, None);
        assert_eq!(MovementFilter::new(None, None, None, Some(0)).limit, 1);
    }

    #[test]
    fn issue_floors_at_zero_but_journals_requested_amount() {
        let mut stock = record(3, 0);
        let draft = stock.issue(5).unwrap();
        assert_eq!(stock.qty, 0);
        assert_eq!(draft, MovementDraft::new(MovementType::Out, 5));
    }

    #[test]
    fn adjust_records_signed_value_verbatim() {
        let mut stock = record(7, 2);
        let draft = stock.adjust(-4);
        assert_eq!(stock.qty, 0);
        assert_eq!(stock.reserved_qty, 2);
        assert_eq!(draft.qty, -4);
        assert_eq!(draft.movement_type, MovementType::Adjust);
    }

    #[test]
    fn receive_rejects_non_positive_quantity() {
        let mut stock = record(1, 0);
        assert!(matches!(stock.receive(0), Err(AppError::NonPositiveQuantity)));
        assert_eq!(stock.qty, 1);
    }

    #[test]
    fn reserve_moves_available_into_reserved() {
        // Cenário A
        let mut stock = record(10, 0);
        let draft = stock.reserve(4).unwrap();
        assert_eq!((stock.qty, stock.reserved_qty), (6, 4));
        assert_eq!(draft, MovementDraft::new(MovementType::Reserve, 4));
    }

    #[test]
    fn reservation_plan_splits_shortfall() {
        // Cenário B
        let plan = ReservationPlan::new(10, 15);
        assert_eq!(plan.can_reserve, 10);
        assert_eq!(plan.missing, 5);

        let plan = ReservationPlan::new(0, 3);
        assert_eq!((plan.can_reserve, plan.missing), (0, 3));
    }

    #[test]
    fn ship_requires_enough_reserved() {
        // Cenário C
        let mut stock = record(0, 4);
        stock.ship(4).unwrap();
        assert_eq!(stock.reserved_qty, 0);

        // Cenário D
        let mut stock = record(0, 2);
        let err = stock.ship(4).unwrap_err();
        assert_eq!(err.to_string(), "Not enough reserved stock to ship");
        assert_eq!(stock.reserved_qty, 2);
    }

    #[test]
    fn unreserve_cannot_release_more_than_reserved() {
        let mut stock = record(1, 2);
        assert!(matches!(stock.unreserve(3), Err(AppError::NotEnoughReserved)));
        stock.unreserve(2).unwrap();
        assert_eq!((stock.qty, stock.reserved_qty), (3, 0));
    }

    #[test]
    fn accept_production_clears_on_order_with_floor() {
        let mut stock = record(0, 0);
        stock.backorder(3).unwrap();
        stock.accept_production(5).unwrap();
        assert_eq!(stock.qty, 5);
        assert_eq!(stock.on_order_qty, 0);
    }

    #[test]
    fn counters_refuse_to_overflow() {
        let mut stock = record(i32::MAX, 0);
        assert!(matches!(stock.receive(5), Err(AppError::QuantityOverflow)));
        assert!(matches!(stock.accept_production(1), Err(AppError::QuantityOverflow)));
        assert_eq!(stock.qty, i32::MAX);

        stock.reserve(1).unwrap();
        stock.receive(1).unwrap();
        assert!(matches!(stock.unreserve(1), Err(AppError::QuantityOverflow)));
        assert_eq!((stock.qty, stock.reserved_qty), (i32::MAX, 1));

        let mut stock = record(0, 0);
        stock.backorder(i32::MAX).unwrap();
        assert!(matches!(stock.backorder(1), Err(AppError::QuantityOverflow)));
        assert_eq!(stock.on_order_qty, i32::MAX);
    }

    #[test]
    fn replay_of_large_journal_does_not_overflow() {
        let journal = vec![
            movement(MovementType::In, i32::MAX, None),
            movement(MovementType::Reserve, 1, Some(7)),
            movement(MovementType::In, 1, None),
        ];
        let mut stock = record(0, 0);
        stock.receive(i32::MAX).unwrap();
        stock.reserve(1).unwrap();
        stock.receive(1).unwrap();

        assert_eq!(StockBalance::replay(&journal), stock.balance());
    }

    #[test]
    fn backorder_is_not_journaled() {
        let mut stock = record(0, 0);
        assert_eq!(LedgerOp::Backorder(4).apply(&mut stock).unwrap(), None);
        assert_eq!(stock.on_order_qty, 4);

        let draft = LedgerOp::Receive(2).apply(&mut stock).unwrap();
        assert_eq!(draft, Some(MovementDraft::new(MovementType::In, 2)));
        assert!(!LedgerOp::Ship(1).creates_record());
    }

    #[test]
    fn replay_distinguishes_issue_from_shipment() {
        let journal = vec![
            movement(MovementType::In, 10, None),
            movement(MovementType::Reserve, 4, Some(7)),
            movement(MovementType::Out, 4, Some(7)),
            movement(MovementType::Out, 20, None),
            movement(MovementType::Adjust, 3, None),
            movement(MovementType::Reserve, 1, Some(8)),
            movement(MovementType::Unreserve, 1, Some(8)),
        ];
        let replayed = StockBalance::replay(&journal);
        assert_eq!(replayed, StockBalance { qty: 3, reserved_qty: 0 });
    }

    #[test]
    fn reconciliation_flags_drift() {
        let journal = vec![movement(MovementType::In, 5, None)];
        let ok = Reconciliation::new("MSK".into(), 1, StockBalance { qty: 5, reserved_qty: 0 }, &journal);
        assert!(ok.consistent);

        let drift = Reconciliation::new("MSK".into(), 1, StockBalance { qty: 6, reserved_qty: 0 }, &journal);
        assert!(!drift.consistent);
        assert_eq!(drift.movements, 1);
    }
}
