//! Order and kit payloads exchanged with the calculator backend.
//!
//! These are data-transfer shapes only. Optional fields are skipped when
//! absent so a payload survives a serialize/deserialize pass unchanged, and
//! unknown breakdown entries are carried through in `extra`.

use serde::{Deserialize, Serialize};

use super::id::{CalculationId, DealId, DocumentId, FileId, KitId, OrderId, UserId};

/// Cost breakdown attached to a priced order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mat_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub administrative_expenses: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dop_mat_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dop_salary: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mat_price_full: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overhead_expenses: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_of_hour: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_of_hour_with_others: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_per_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_special_equipment_to_quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sum_costs_labor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_price: Option<f64>,
    /// Breakdown entries this build does not model.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Part parameters shared by every order shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBase {
    pub service_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_name: Option<String>,
    pub file_id: FileId,
    pub quantity: u32,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub material_id: String,
    pub material_form: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_id: Option<String>,
    #[serde(default)]
    pub cover_id: Vec<String>,
    /// Spelled as the backend spells it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procces_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_dimensions: Option<u32>,
    pub k_otk: String,
    #[serde(default)]
    pub k_cert: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_price_breakdown: Option<PriceBreakdown>,
}

/// Body of an order calculation or creation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPayload {
    #[serde(flatten)]
    pub base: OrderBase,
    #[serde(default)]
    pub document_ids: Vec<DocumentId>,
}

/// A priced order as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResponse {
    #[serde(flatten)]
    pub base: OrderBase,
    pub order_id: OrderId,
    pub user_id: UserId,
    #[serde(default)]
    pub document_ids: Vec<DocumentId>,
    #[serde(default)]
    pub composite_rig: String,
    pub status: String,
    #[serde(default)]
    pub mat_volume: f64,
    #[serde(default)]
    pub detail_price: f64,
    #[serde(default)]
    pub detail_price_one: f64,
    #[serde(default)]
    pub detail_time: f64,
    #[serde(default)]
    pub total_price: f64,
    #[serde(default)]
    pub mat_weight: f64,
    #[serde(default)]
    pub mat_price: f64,
    #[serde(default)]
    pub work_price: f64,
    #[serde(default)]
    pub k_quantity: f64,
    #[serde(default)]
    pub total_time: f64,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub manufacturing_cycle: f64,
    #[serde(default)]
    pub suitable_machines: Vec<serde_json::Value>,
    #[serde(default)]
    pub calc_ids: Vec<CalculationId>,
}

/// A set of orders delivered together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kit_id: Option<KitId>,
    pub kit_name: String,
    pub order_ids: Vec<OrderId>,
    pub user_id: UserId,
    pub quantity: u32,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    pub bitrix_deal_id: DealId,
    pub location: String,
    pub kit_price: f64,
    pub delivery_price: f64,
    pub total_kit_price: f64,
}
