//! Wire representations of the restaurant API. Field names follow the server's (Spanish, camelCase) JSON; each type
//! converts into its `comanda_engine` counterpart.
use chrono::{DateTime, NaiveDate, Utc};
use comanda_common::Colones;
use comanda_engine::{
    cart_types::{
        Branch,
        BranchId,
        BranchRef,
        CardId,
        CartLine,
        CartSnapshot,
        CartTotals,
        Coupon,
        CouponCode,
        LineId,
        Order,
        OrderId,
        OrderStatus,
        ProductId,
    },
    exchange_objects::{ExchangeRate, RateSource},
    payment_objects::{ServerPaymentRef, StoredCard},
    traits::ExchangeRateError,
};
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::RestaurantApiError;

//--------------------------------------        Carrito       ---------------------------------------------------------
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarritoResponse {
    #[serde(default)]
    pub productos: Vec<DetalleCarrito>,
    #[serde(default)]
    pub sucursal: Option<SucursalDto>,
    #[serde(default)]
    pub sucursal_id: Option<i64>,
    #[serde(default)]
    pub cupon: Option<CuponDto>,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub subtotal: Colones,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub descuento: Colones,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub impuesto: Colones,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub total: Colones,
    #[serde(default)]
    pub tiempo_estimado: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetalleCarrito {
    pub id: i64,
    pub producto_id: i64,
    pub nombre: String,
    pub cantidad: u32,
    pub precio_unitario: Colones,
    #[serde(default)]
    pub imagen_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SucursalDto {
    pub id: i64,
    pub nombre: String,
    #[serde(default)]
    pub direccion: String,
    #[serde(default)]
    pub provincia: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CuponDto {
    pub codigo: String,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub monto_descuento: Colones,
}

/// The body of `POST /cupones/aplicar`. Older servers answer with the bare coupon.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AplicarCuponResponse {
    Envuelto { cupon: CuponDto },
    Directo(CuponDto),
}

impl From<AplicarCuponResponse> for CuponDto {
    fn from(value: AplicarCuponResponse) -> Self {
        match value {
            AplicarCuponResponse::Envuelto { cupon } => cupon,
            AplicarCuponResponse::Directo(cupon) => cupon,
        }
    }
}

impl From<SucursalDto> for Branch {
    fn from(dto: SucursalDto) -> Self {
        Branch { id: BranchId(dto.id), name: dto.nombre, address: dto.direccion, province: dto.provincia }
    }
}

impl TryFrom<CuponDto> for Coupon {
    type Error = RestaurantApiError;

    fn try_from(dto: CuponDto) -> Result<Self, Self::Error> {
        let code = CouponCode::parse(&dto.codigo)
            .map_err(|_| RestaurantApiError::InvalidResponse("The server returned a blank coupon code".into()))?;
        Ok(Coupon { code, discount: dto.monto_descuento })
    }
}

impl From<DetalleCarrito> for CartLine {
    fn from(dto: DetalleCarrito) -> Self {
        CartLine {
            id: LineId(dto.id),
            product_id: ProductId(dto.producto_id),
            name: dto.nombre,
            quantity: dto.cantidad,
            unit_price: dto.precio_unitario,
            image_url: dto.imagen_url.filter(|s| !s.trim().is_empty()),
        }
    }
}

impl TryFrom<CarritoResponse> for CartSnapshot {
    type Error = RestaurantApiError;

    fn try_from(dto: CarritoResponse) -> Result<Self, Self::Error> {
        if let Some(line) = dto.productos.iter().find(|l| l.cantidad == 0) {
            return Err(RestaurantApiError::InvalidResponse(format!("Cart line {} has a quantity of zero", line.id)));
        }
        let branch = match (dto.sucursal, dto.sucursal_id) {
            (Some(sucursal), _) => BranchRef::Embedded(sucursal.into()),
            (None, Some(id)) => BranchRef::Id(BranchId(id)),
            (None, None) => BranchRef::None,
        };
        let coupon = dto.cupon.map(Coupon::try_from).transpose()?;
        Ok(CartSnapshot {
            lines: dto.productos.into_iter().map(CartLine::from).collect(),
            branch,
            coupon,
            totals: CartTotals {
                subtotal: dto.subtotal,
                discount: dto.descuento,
                tax: dto.impuesto,
                total: dto.total,
            },
            estimated_prep_minutes: dto.tiempo_estimado.unwrap_or_default(),
        })
    }
}

//--------------------------------------       Requests       ---------------------------------------------------------
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgregarProducto {
    pub producto_id: i64,
    pub cantidad: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActualizarCantidad {
    pub cantidad: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeleccionarSucursal {
    pub sucursal_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AplicarCupon {
    pub codigo: String,
}

/// `metodoPagoId` is either the `"efectivo"` sentinel or a numeric card id.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MetodoPagoId {
    Centinela(&'static str),
    Tarjeta(i64),
}

impl From<ServerPaymentRef> for MetodoPagoId {
    fn from(value: ServerPaymentRef) -> Self {
        match value {
            ServerPaymentRef::Sentinel(s) => MetodoPagoId::Centinela(s),
            ServerPaymentRef::Card(id) => MetodoPagoId::Tarjeta(id),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeleccionarMetodoPago {
    pub metodo_pago_id: MetodoPagoId,
}

//--------------------------------------       Tarjetas       ---------------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TarjetaDto {
    pub id: i64,
    #[serde(default)]
    pub marca: String,
    pub ultimos_digitos: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub principal: bool,
}

impl From<TarjetaDto> for StoredCard {
    fn from(dto: TarjetaDto) -> Self {
        StoredCard {
            id: CardId(dto.id),
            brand: if dto.marca.trim().is_empty() { "Card".to_string() } else { dto.marca },
            last_four_digits: dto.ultimos_digitos,
            alias: dto.alias.filter(|a| !a.trim().is_empty()),
            principal: dto.principal,
        }
    }
}

//--------------------------------------        Pedidos       ---------------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PedidoDto {
    #[serde(alias = "pedidoId")]
    pub id: i64,
    pub estado: String,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub total: Colones,
    #[serde(default)]
    pub sucursal: Option<SucursalDto>,
    #[serde(default)]
    pub fecha_creacion: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tiempo_estimado: Option<u32>,
}

/// Order endpoints answer either with the bare object or wrapped in `{"pedido": ...}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PedidoResponse {
    Envuelto { pedido: PedidoDto },
    Directo(PedidoDto),
}

impl From<PedidoResponse> for PedidoDto {
    fn from(value: PedidoResponse) -> Self {
        match value {
            PedidoResponse::Envuelto { pedido } => pedido,
            PedidoResponse::Directo(pedido) => pedido,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MisPedidosResponse {
    Envuelto { pedidos: Vec<PedidoDto> },
    Directo(Vec<PedidoDto>),
}

impl From<MisPedidosResponse> for Vec<PedidoDto> {
    fn from(value: MisPedidosResponse) -> Self {
        match value {
            MisPedidosResponse::Envuelto { pedidos } => pedidos,
            MisPedidosResponse::Directo(pedidos) => pedidos,
        }
    }
}

impl From<PedidoDto> for Order {
    fn from(dto: PedidoDto) -> Self {
        Order {
            id: OrderId(dto.id),
            status: OrderStatus::from_server(&dto.estado),
            total: dto.total,
            branch: dto.sucursal.map(Branch::from),
            created_at: dto.fecha_creacion,
            estimated_prep_minutes: dto.tiempo_estimado,
        }
    }
}

//--------------------------------------     Tipo de cambio   ---------------------------------------------------------
#[derive(Debug, Clone, Deserialize)]
pub struct TipoCambioDto {
    #[serde(deserialize_with = "number_or_string")]
    pub compra: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub venta: f64,
    /// Either a plain date or a full timestamp. Only the date part is kept.
    pub fecha: String,
}

impl TipoCambioDto {
    pub fn into_rate(self, source: RateSource) -> Result<ExchangeRate, ExchangeRateError> {
        let date = self.fecha.get(..10).unwrap_or(&self.fecha);
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| ExchangeRateError::InvalidRate(format!("Invalid rate date '{}'. {e}", self.fecha)))?;
        ExchangeRate::new(self.compra, self.venta, date, source)
    }
}

fn number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse::<f64>().map_err(|e| de::Error::custom(format!("Invalid number '{s}'. {e}"))),
    }
}

/// Money fields the server leaves as `null` (no coupon, nothing in the cart yet) count as zero.
fn null_as_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Colones, D::Error> {
    Ok(Option::<Colones>::deserialize(deserializer)?.unwrap_or_default())
}

//--------------------------------------        Errors        ---------------------------------------------------------
/// Error bodies carry a human readable message under one of these keys.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub mensaje: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// Extract the server's message from a response body. Plain-text bodies are used as they are; HTML error pages
    /// are ignored.
    pub fn message_from(body: &str) -> Option<String> {
        let body = body.trim();
        if body.is_empty() || body.starts_with('<') {
            return None;
        }
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => [parsed.mensaje, parsed.message, parsed.error]
                .into_iter()
                .flatten()
                .map(|m| m.trim().to_string())
                .find(|m| !m.is_empty()),
            Err(_) if body.starts_with('{') || body.starts_with('[') => None,
            Err(_) => Some(body.to_string()),
        }
    }
}
