use std::{fmt::Debug, sync::Arc};

use comanda_engine::{
    cart_types::{Branch, BranchId, CardId, CartSnapshot, Coupon, CouponCode, LineId, Order, OrderId, ProductId},
    exchange_objects::{ExchangeRate, RateSource},
    payment_objects::{PaymentMethodId, StoredCard},
    traits::{
        BackendError,
        CartManagement,
        ExchangeRateError,
        ExchangeRateSource,
        OrderManagement,
        PaymentMethodManagement,
    },
};
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE},
    Client,
    Method,
    Response,
    StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    data_objects::{
        ActualizarCantidad,
        AgregarProducto,
        AplicarCupon,
        AplicarCuponResponse,
        CarritoResponse,
        CuponDto,
        ErrorBody,
        MisPedidosResponse,
        PedidoDto,
        PedidoResponse,
        SeleccionarMetodoPago,
        SeleccionarSucursal,
        SucursalDto,
        TarjetaDto,
        TipoCambioDto,
    },
    ApiConfig,
    RestaurantApiError,
    Session,
};

/// `RestaurantApi` talks to the restaurant's REST API on behalf of one customer.
///
/// Clones share the HTTP client and the [`Session`], so a 401 seen by any clone logs them all out.
#[derive(Clone)]
pub struct RestaurantApi {
    config: ApiConfig,
    client: Arc<Client>,
    session: Arc<Session>,
}

impl Debug for RestaurantApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RestaurantApi ({})", self.config.base_url)
    }
}

impl RestaurantApi {
    pub fn new(config: ApiConfig, session: Arc<Session>) -> Result<Self, RestaurantApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| RestaurantApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client), session })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    async fn send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<Response, RestaurantApiError> {
        let url = self.url(path);
        trace!("🌐️ {method} {url}");
        let mut req = self.client.request(method, url);
        if let Some(token) = self.session.token() {
            req = req.bearer_auth(token.reveal());
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| RestaurantApiError::RequestError(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            trace!("🌐️ {path} => {status}");
            return Ok(response);
        }
        match status {
            StatusCode::UNAUTHORIZED => {
                warn!("🌐️ {path} => 401. Discarding the session token.");
                self.session.clear();
                Err(RestaurantApiError::Unauthorized)
            },
            StatusCode::NOT_FOUND => {
                debug!("🌐️ {path} => 404");
                Err(RestaurantApiError::NotFound(path.to_string()))
            },
            _ => {
                let body = response.text().await.unwrap_or_default();
                let message = ErrorBody::message_from(&body);
                debug!("🌐️ {path} => {status}. {}", message.as_deref().unwrap_or("No message"));
                Err(RestaurantApiError::QueryError { status: status.as_u16(), message })
            },
        }
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, RestaurantApiError> {
        let response = self.send(method, path, body).await?;
        response.json::<T>().await.map_err(|e| RestaurantApiError::JsonError(e.to_string()))
    }

    /// Like [`Self::rest_query`], for endpoints whose response body carries nothing we need.
    pub async fn rest_command<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<(), RestaurantApiError> {
        let response = self.send(method, path, body).await?;
        // Drain the body so that the connection can be reused
        let _ = response.bytes().await;
        Ok(())
    }
}

impl CartManagement for RestaurantApi {
    async fn fetch_cart(&self) -> Result<CartSnapshot, BackendError> {
        let dto = self.rest_query::<CarritoResponse, ()>(Method::GET, "/carrito", None).await?;
        Ok(CartSnapshot::try_from(dto)?)
    }

    async fn fetch_branch(&self, branch_id: BranchId) -> Result<Branch, BackendError> {
        let path = format!("/sucursales/{}", branch_id.value());
        let dto = self.rest_query::<SucursalDto, ()>(Method::GET, &path, None).await?;
        Ok(dto.into())
    }

    async fn add_product(&self, product_id: ProductId, quantity: u32) -> Result<(), BackendError> {
        let body = AgregarProducto { producto_id: product_id.value(), cantidad: quantity };
        self.rest_command(Method::POST, "/carrito/agregar", Some(body)).await?;
        Ok(())
    }

    async fn update_line_quantity(&self, line_id: LineId, quantity: u32) -> Result<(), BackendError> {
        let path = format!("/carrito/detalle/{}", line_id.value());
        self.rest_command(Method::PUT, &path, Some(ActualizarCantidad { cantidad: quantity })).await?;
        Ok(())
    }

    async fn remove_line(&self, line_id: LineId) -> Result<(), BackendError> {
        let path = format!("/carrito/detalle/{}", line_id.value());
        self.rest_command::<()>(Method::DELETE, &path, None).await?;
        Ok(())
    }

    async fn select_branch(&self, branch_id: BranchId) -> Result<(), BackendError> {
        let body = SeleccionarSucursal { sucursal_id: branch_id.value() };
        self.rest_command(Method::PUT, "/carrito/sucursal", Some(body)).await?;
        Ok(())
    }

    async fn set_payment_method(&self, method: &PaymentMethodId) -> Result<(), BackendError> {
        let body = SeleccionarMetodoPago { metodo_pago_id: method.server_value().into() };
        self.rest_command(Method::PUT, "/carrito/metodopago", Some(body)).await?;
        Ok(())
    }

    async fn apply_coupon(&self, code: &CouponCode) -> Result<Coupon, BackendError> {
        let body = AplicarCupon { codigo: code.as_str().to_string() };
        let response = self.rest_query::<AplicarCuponResponse, _>(Method::POST, "/cupones/aplicar", Some(body)).await?;
        Ok(Coupon::try_from(CuponDto::from(response))?)
    }

    async fn remove_coupon(&self) -> Result<(), BackendError> {
        self.rest_command::<()>(Method::DELETE, "/cupones/remover", None).await?;
        Ok(())
    }
}

impl OrderManagement for RestaurantApi {
    async fn create_order(&self) -> Result<Order, BackendError> {
        let response = self.rest_query::<PedidoResponse, ()>(Method::POST, "/pedidos/crear", None).await?;
        Ok(PedidoDto::from(response).into())
    }

    async fn fetch_order(&self, order_id: OrderId) -> Result<Order, BackendError> {
        let path = format!("/pedidos/{}", order_id.value());
        let response = self.rest_query::<PedidoResponse, ()>(Method::GET, &path, None).await?;
        Ok(PedidoDto::from(response).into())
    }

    async fn fetch_my_orders(&self) -> Result<Vec<Order>, BackendError> {
        let response = self.rest_query::<MisPedidosResponse, ()>(Method::GET, "/pedidos/mis-pedidos", None).await?;
        let orders: Vec<PedidoDto> = response.into();
        Ok(orders.into_iter().map(Order::from).collect())
    }
}

impl PaymentMethodManagement for RestaurantApi {
    async fn fetch_cards(&self) -> Result<Vec<StoredCard>, BackendError> {
        let cards = self.rest_query::<Vec<TarjetaDto>, ()>(Method::GET, "/metodos-pago", None).await?;
        Ok(cards.into_iter().map(StoredCard::from).collect())
    }

    async fn delete_card(&self, card_id: CardId) -> Result<(), BackendError> {
        let path = format!("/metodos-pago/{}", card_id.value());
        self.rest_command::<()>(Method::DELETE, &path, None).await?;
        Ok(())
    }
}

impl RestaurantApi {
    async fn fetch_rate(&self, path: &str, source: RateSource) -> Result<ExchangeRate, ExchangeRateError> {
        let dto = self
            .rest_query::<TipoCambioDto, ()>(Method::GET, path, None)
            .await
            .map_err(|e| ExchangeRateError::Unavailable(e.to_string()))?;
        dto.into_rate(source)
    }
}

impl ExchangeRateSource for RestaurantApi {
    async fn fetch_live_rate(&self) -> Result<ExchangeRate, ExchangeRateError> {
        self.fetch_rate("/tipo-cambio/actual", RateSource::Primary).await
    }

    async fn fetch_cached_rate(&self) -> Result<ExchangeRate, ExchangeRateError> {
        self.fetch_rate("/tipo-cambio/cache", RateSource::Cached).await
    }
}
