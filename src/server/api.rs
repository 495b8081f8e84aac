//! REST API implementation using rouille.
//!
//! # Purpose
//!
//! Owns the HTTP server lifecycle and all request handling. CRUD routes operate
//! on the shared [`RepairRepository`]; device routes forward commands through
//! the injected [`EventBridge`] and answer immediately.
//!
//! # Key types
//!
//! - [`ApiServer`] - configuration + collaborators, start/stop lifecycle
//! - [`ServerHandle`] - one running server (listener thread, stop channel, in-flight counter)
//! - [`ServerConfig`] - bind address, port, worker pool size, shutdown grace
//!
//! # Thread safety
//!
//! - Requests run on rouille's worker pool, concurrently with each other and
//!   with the host loop; the repository serializes access internally
//! - Handler panics are caught and reported as 500 envelopes
//! - CORS headers added to all responses for browser access
//!
//! # Used by
//!
//! - `server/mod.rs` - re-exports public types
//! - `app.rs` - builds the server from settings, starts and stops it

use anyhow::{Result, anyhow};
use chrono::Timelike;
use log::{debug, info, trace, warn};
use rouille::{Request, Response};
use serde::de::DeserializeOwned;
use std::any::Any;
use std::io::Read;
use std::net::SocketAddr;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::dto::{
    ApiResponse, CaptureResponse, RepairRequest, RepairResponse, SharedDeviceState, StatusResponse,
    TickerRequest, TickerResponse,
};
use super::error::ApiError;
use crate::core::bridge::{EventBridge, NullBridge};
use crate::core::repair::normalize_plate;
use crate::core::repository::RepairRepository;
use crate::core::time_codec::{SECONDS_PER_DAY, TimeParseError};

const GREETING: &str = "Hello, repair-board!";
const CAR_REPAIR_PATH: &str = "/api/car-repair";
const MAX_BODY_BYTES: u64 = 64 * 1024;

/// Source of the server's current time of day, in seconds since midnight.
pub type Clock = Arc<dyn Fn() -> u32 + Send + Sync>;

/// Local wall clock.
pub fn local_seconds_of_day() -> u32 {
    chrono::Local::now()
        .num_seconds_from_midnight()
        .min(SECONDS_PER_DAY - 1)
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    /// 0 picks a free port
    pub port: u16,
    pub workers: usize,
    /// How long `stop` waits for in-flight requests
    pub shutdown_grace: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8080,
            workers: 4,
            shutdown_grace: Duration::from_secs(2),
        }
    }
}

/// Collaborators shared by every request.
#[derive(Clone)]
struct Context {
    repository: Option<Arc<RepairRepository>>,
    bridge: Arc<dyn EventBridge>,
    device: Arc<SharedDeviceState>,
    clock: Clock,
}

/// REST API server
pub struct ApiServer {
    config: ServerConfig,
    ctx: Context,
    running: Option<ServerHandle>,
}

impl ApiServer {
    /// Server with no repository (CRUD routes answer 503) and no device.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            ctx: Context {
                repository: None,
                bridge: Arc::new(NullBridge),
                device: Arc::new(SharedDeviceState::default()),
                clock: Arc::new(local_seconds_of_day),
            },
            running: None,
        }
    }

    pub fn with_repository(mut self, repository: Arc<RepairRepository>) -> Self {
        self.ctx.repository = Some(repository);
        self
    }

    pub fn with_bridge(mut self, bridge: Arc<dyn EventBridge>) -> Self {
        self.ctx.bridge = bridge;
        self
    }

    pub fn with_device_state(mut self, device: Arc<SharedDeviceState>) -> Self {
        self.ctx.device = device;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.ctx.clock = clock;
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind and serve on a new background listener. The caller owns the
    /// returned handle; dropping it stops the server.
    pub fn spawn(&self) -> Result<ServerHandle> {
        let addr = format!("{}:{}", self.config.bind, self.config.port);
        let ctx = self.ctx.clone();
        let in_flight = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&in_flight);

        let server = rouille::Server::new(addr.as_str(), move |request| {
            let _guard = InFlight::enter(&counter);
            ctx.handle(request)
        })
        .map_err(|e| anyhow!("Failed to bind API server on {}: {}", addr, e))?
        .pool_size(self.config.workers.max(1));

        let local_addr = server.server_addr();
        let (join, stop_tx) = server.stoppable();
        info!("API server listening on http://{}", local_addr);

        Ok(ServerHandle {
            addr: local_addr,
            join: Some(join),
            stop_tx,
            in_flight,
            grace: self.config.shutdown_grace,
        })
    }

    /// Start serving. Returns the bound address; a no-op when already running.
    pub fn start(&mut self) -> Result<SocketAddr> {
        if let Some(handle) = &self.running {
            debug!("API server already running on {}", handle.addr());
            return Ok(handle.addr());
        }
        let handle = self.spawn()?;
        let addr = handle.addr();
        self.running = Some(handle);
        Ok(addr)
    }

    /// Stop serving, draining in-flight requests. A no-op when stopped.
    pub fn stop(&mut self) {
        if let Some(handle) = self.running.take() {
            handle.shutdown();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(ServerHandle::addr)
    }

    /// Dispatch one request without a listener (embedding, tests).
    pub fn handle_request(&self, request: &Request) -> Response {
        self.ctx.handle(request)
    }
}

impl Drop for ApiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// A running server.
pub struct ServerHandle {
    addr: SocketAddr,
    join: Option<JoinHandle<()>>,
    stop_tx: mpsc::Sender<()>,
    in_flight: Arc<AtomicUsize>,
    grace: Duration,
}

impl ServerHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Requests currently inside a handler.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Stop accepting, then wait up to the grace period for handlers to finish.
    pub fn shutdown(mut self) {
        self.shutdown_inner();
    }

    fn shutdown_inner(&mut self) {
        let Some(join) = self.join.take() else {
            return;
        };
        // Err only if the listener thread is already gone
        let _ = self.stop_tx.send(());
        if join.join().is_err() {
            warn!("API listener thread on {} panicked", self.addr);
        }

        let deadline = Instant::now() + self.grace;
        loop {
            let pending = self.in_flight();
            if pending == 0 {
                break;
            }
            if Instant::now() >= deadline {
                warn!(
                    "API server on {}: {} request(s) still running after {:?}, abandoning",
                    self.addr, pending, self.grace
                );
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        info!("API server on {} stopped", self.addr);
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.shutdown_inner();
    }
}

/// Counts a request as in flight for the guard's lifetime.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Context {
    fn handle(&self, request: &Request) -> Response {
        trace!("{} {}", request.method(), request.url());

        // Handle preflight
        if request.method() == "OPTIONS" {
            return Response::empty_204()
                .with_additional_header("Access-Control-Allow-Origin", "*")
                .with_additional_header(
                    "Access-Control-Allow-Methods",
                    "GET, POST, PUT, DELETE, OPTIONS",
                )
                .with_additional_header("Access-Control-Allow-Headers", "Content-Type");
        }

        let response = match panic::catch_unwind(AssertUnwindSafe(|| self.route(request))) {
            Ok(response) => response,
            Err(payload) => ApiError::Internal(panic_message(&*payload)).into_response(),
        };

        response.with_additional_header("Access-Control-Allow-Origin", "*")
    }

    fn route(&self, request: &Request) -> Response {
        // /api/car-repair/{plate} handled manually (router! doesn't capture arbitrary text well)
        let path = request.url();
        if let Some(plate) = path
            .strip_prefix(CAR_REPAIR_PATH)
            .and_then(|rest| rest.strip_prefix('/'))
        {
            let result = match request.method() {
                "GET" => self.get_repair(plate),
                "PUT" => self.update_repair(plate, request),
                "DELETE" => self.delete_repair(plate),
                _ => Err(ApiError::NotFound("Not found".to_string())),
            };
            return result.unwrap_or_else(ApiError::into_response);
        }

        let result = rouille::router!(request,
            (GET) ["/"] => {
                Ok(Response::text(GREETING))
            },
            (GET) ["/status"] => {
                Ok(self.get_status())
            },

            // Device commands
            (POST) ["/camera/capture"] => {
                Ok(self.post_capture())
            },
            (POST) ["/ticker"] => {
                self.post_ticker(request)
            },

            // Repair records
            (GET) ["/api/car-repair"] => {
                self.list_repairs()
            },
            (POST) ["/api/car-repair"] => {
                self.create_repair(request)
            },
            (PUT) ["/api/car-repair"] => {
                Err(missing_plate())
            },
            (DELETE) ["/api/car-repair"] => {
                Err(missing_plate())
            },

            // Fallback
            _ => {
                Err(ApiError::NotFound("Not found".to_string()))
            }
        );

        result.unwrap_or_else(ApiError::into_response)
    }

    fn repository(&self) -> Result<&RepairRepository, ApiError> {
        self.repository
            .as_deref()
            .ok_or_else(|| ApiError::Unavailable("Repair store not available".to_string()))
    }

    fn get_status(&self) -> Response {
        Response::json(&StatusResponse {
            status: "running".to_string(),
            camera: self.device.camera(),
        })
    }

    fn post_capture(&self) -> Response {
        self.bridge.post_capture();
        Response::json(&CaptureResponse {
            result: "capture command sent".to_string(),
        })
    }

    fn post_ticker(&self, request: &Request) -> Result<Response, ApiError> {
        let req: TickerRequest = read_json(request)?;
        self.bridge.post_ticker_text(&req.text);
        Ok(Response::json(&TickerResponse {
            status: "ok".to_string(),
            text: req.text,
        }))
    }

    fn list_repairs(&self) -> Result<Response, ApiError> {
        let records = self.repository()?.get_all();
        let data: Vec<RepairResponse> = records.iter().map(RepairResponse::from).collect();
        Ok(Response::json(&ApiResponse::ok("Success", data)))
    }

    fn get_repair(&self, plate: &str) -> Result<Response, ApiError> {
        let plate = require_plate(plate)?;
        let record = self
            .repository()?
            .get_by_key(&plate)
            .ok_or_else(not_found)?;
        Ok(Response::json(&ApiResponse::ok("Success", RepairResponse::from(&record))))
    }

    fn create_repair(&self, request: &Request) -> Result<Response, ApiError> {
        let repository = self.repository()?;
        let req: RepairRequest = read_json(request)?;
        // Blank plates are left to the store, which refuses them as a conflict
        let plate = normalize_plate(&req.license_plate_number);

        // requestedTime is stamped here, never taken from the body
        let mut record = req.to_record(Some((self.clock)())).map_err(invalid_finish_time)?;
        record.license_plate = plate.clone();

        if !repository.add(record.clone()) {
            return Err(ApiError::Conflict(if plate.is_empty() {
                "Car repair info already exists or invalid data".to_string()
            } else {
                format!("Car repair info already exists: {}", plate)
            }));
        }
        Ok(Response::json(&ApiResponse::ok(
            "Car repair info created successfully",
            RepairResponse::from(&record),
        ))
        .with_status_code(201))
    }

    fn update_repair(&self, plate: &str, request: &Request) -> Result<Response, ApiError> {
        let plate = require_plate(plate)?;
        let repository = self.repository()?;
        let req: RepairRequest = read_json(request)?;
        let body_plate = normalize_plate(&req.license_plate_number);
        if !body_plate.is_empty() && body_plate != plate {
            debug!(
                "PUT {}: body plate '{}' ignored in favor of path",
                plate, req.license_plate_number
            );
        }

        let record = req.to_record(None).map_err(invalid_finish_time)?;
        let stored = repository.replace(&plate, record).ok_or_else(not_found)?;
        Ok(Response::json(&ApiResponse::ok(
            "Car repair info updated successfully",
            RepairResponse::from(&stored),
        )))
    }

    fn delete_repair(&self, plate: &str) -> Result<Response, ApiError> {
        let plate = require_plate(plate)?;
        if !self.repository()?.delete(&plate) {
            return Err(not_found());
        }
        Ok(Response::json(&ApiResponse::ok_msg("Car repair info deleted successfully")))
    }
}

fn read_json<T: DeserializeOwned>(request: &Request) -> Result<T, ApiError> {
    let body = request
        .data()
        .ok_or_else(|| ApiError::Validation("Invalid request: body already consumed".to_string()))?;
    serde_json::from_reader(body.take(MAX_BODY_BYTES))
        .map_err(|e| ApiError::Validation(format!("Invalid request: {}", e)))
}

fn require_plate(plate: &str) -> Result<String, ApiError> {
    let plate = normalize_plate(plate);
    if plate.is_empty() {
        return Err(missing_plate());
    }
    Ok(plate)
}

fn missing_plate() -> ApiError {
    ApiError::Validation("License plate number is required".to_string())
}

fn invalid_finish_time(e: TimeParseError) -> ApiError {
    ApiError::Validation(format!("Invalid request: estimatedFinishTime: {}", e))
}

fn not_found() -> ApiError {
    ApiError::NotFound("Car repair info not found".to_string())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected internal fault".to_string()
    }
}
