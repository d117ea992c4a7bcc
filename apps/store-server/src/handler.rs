//! # Connection Handler
//!
//! One task per accepted TCP connection, strictly sequential: read a
//! line, dispatch, write the full response, read the next line.
//!
//! ## Connection State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   accept ──► Unauthenticated ──LOGIN ok──► Authenticated               │
//! │                   │    ▲                        │                       │
//! │                   │    └────────LOGIN ok────────┤ (re-login swaps      │
//! │                   │                             │  the reservation)     │
//! │              LOGOUT/EOF                    LOGOUT/EOF                   │
//! │                   │                             │                       │
//! │                   └──────────► Closed ◄─────────┘                       │
//! │                                                                         │
//! │  While Unauthenticated every command except LOGIN answers              │
//! │  ERR NOT_LOGGED_IN (LOGOUT still answers OK BYE and closes).           │
//! │                                                                         │
//! │  Error handling per class:                                             │
//! │    parse errors   → ERR token, connection stays open                   │
//! │    domain errors  → ERR token, no partial mutation, stays open         │
//! │    store errors   → ERR INTERNAL, connection torn down                 │
//! │                                                                         │
//! │  On EVERY exit path the session reservation is released.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tracing::{debug, error, info};

use store_core::{parse_cart_spec, quote_cart, Branch, CartLine, CoreError, Customer, Tier};
use store_db::StoreDbError;

use crate::audit::AuditEvent;
use crate::auth::LoginOutcome;
use crate::error::ServerResult;
use crate::protocol::{self, parse_command, Command};
use crate::server::AppState;

/// Whether the read loop keeps going after a command.
enum Flow {
    Continue,
    Close,
}

/// Drives one client connection to completion.
///
/// Errors reaching this level are resource failures; the client gets
/// `ERR INTERNAL` (best effort) and the connection closes. The session
/// reservation, if any, is always released before the task ends.
pub async fn handle_connection(state: Arc<AppState>, stream: TcpStream, peer: SocketAddr) {
    info!(%peer, "client connected");

    let (read_half, mut writer) = stream.into_split();
    let mut reader = BufReader::new(read_half).lines();
    let mut session: Option<String> = None;

    let result = run_loop(&state, &mut reader, &mut writer, &mut session).await;
    if let Err(e) = result {
        error!(%peer, error = %e, "connection torn down");
        // best effort; the socket may already be gone
        let _ = send(&mut writer, protocol::ERR_INTERNAL).await;
    }

    if let Some(username) = session {
        state.auth.logout(&username).await;
    }
    info!(%peer, "client disconnected");
}

async fn run_loop(
    state: &AppState,
    reader: &mut tokio::io::Lines<BufReader<tokio::net::tcp::OwnedReadHalf>>,
    writer: &mut OwnedWriteHalf,
    session: &mut Option<String>,
) -> ServerResult<()> {
    send(writer, protocol::GREETING).await?;

    while let Some(line) = reader.next_line().await? {
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(parse_err) => {
                send(writer, parse_err.wire_line()).await?;
                continue;
            }
        };

        // Auth gate: only LOGIN and LOGOUT pass while unauthenticated.
        if session.is_none()
            && !matches!(command, Command::Login { .. } | Command::Logout)
        {
            send(writer, protocol::ERR_NOT_LOGGED_IN).await?;
            continue;
        }

        let flow = dispatch(state, writer, session, command).await?;
        if matches!(flow, Flow::Close) {
            break;
        }
    }
    Ok(())
}

async fn dispatch(
    state: &AppState,
    writer: &mut OwnedWriteHalf,
    session: &mut Option<String>,
    command: Command,
) -> ServerResult<Flow> {
    match command {
        Command::Login {
            username,
            password,
            role,
        } => login(state, writer, session, &username, &password, &role).await,
        Command::Logout => {
            send(writer, protocol::OK_BYE).await?;
            Ok(Flow::Close)
        }
        Command::List { branch } => list(state, writer, &branch).await,
        Command::Buy { branch, sku, qty } => buy(state, writer, &branch, &sku, qty).await,
        Command::Sell {
            branch,
            sku,
            qty,
            customer_id,
        } => sell(state, writer, &branch, &sku, qty, &customer_id).await,
        Command::SellMulti {
            branch,
            customer_id,
            spec,
        } => sell_multi(state, writer, &branch, &customer_id, &spec).await,
        Command::CustomerAdd {
            id,
            full_name,
            phone,
            tier,
        } => customer_add(state, writer, &id, &full_name, &phone, tier.as_deref()).await,
        Command::CustomerList => customer_list(state, writer).await,
    }
}

// =============================================================================
// Commands
// =============================================================================

async fn login(
    state: &AppState,
    writer: &mut OwnedWriteHalf,
    session: &mut Option<String>,
    username: &str,
    password: &str,
    role: &str,
) -> ServerResult<Flow> {
    match state.auth.login(username, password, role).await? {
        LoginOutcome::Success => {
            // Re-login swaps the reservation, never leaks the old one.
            if let Some(previous) = session.replace(username.to_string()) {
                if previous != username {
                    state.auth.logout(&previous).await;
                }
            }
            send(writer, protocol::OK_LOGIN).await?;
        }
        LoginOutcome::InvalidCredentials => {
            state.audit.record(AuditEvent::LoginDenied {
                username: username.to_string(),
                reason: "INVALID_CREDENTIALS".to_string(),
            });
            send(writer, "ERR LOGIN INVALID_CREDENTIALS").await?;
        }
        LoginOutcome::AlreadyConnected => {
            state.audit.record(AuditEvent::LoginDenied {
                username: username.to_string(),
                reason: "ALREADY_CONNECTED".to_string(),
            });
            send(writer, "ERR LOGIN ALREADY_CONNECTED").await?;
        }
    }
    Ok(Flow::Continue)
}

async fn list(state: &AppState, writer: &mut OwnedWriteHalf, branch: &str) -> ServerResult<Flow> {
    let Some(branch) = parse_branch(writer, branch).await? else {
        return Ok(Flow::Continue);
    };

    let products = state.inventory.list_by_branch(branch).await?;
    let mut response = String::new();
    for product in &products {
        response.push_str(&protocol::item_line(product));
        response.push('\n');
    }
    response.push_str(protocol::OK_END);
    send(writer, &response).await?;
    Ok(Flow::Continue)
}

async fn buy(
    state: &AppState,
    writer: &mut OwnedWriteHalf,
    branch: &str,
    sku: &str,
    qty: i64,
) -> ServerResult<Flow> {
    let Some(branch) = parse_branch(writer, branch).await? else {
        return Ok(Flow::Continue);
    };

    match state.inventory.adjust_quantity(branch, sku, qty).await {
        Ok(_) => {
            state.audit.record(AuditEvent::StockOrdered {
                branch: branch.to_string(),
                sku: sku.to_string(),
                quantity: qty,
            });
            send(writer, protocol::OK_BUY).await?;
        }
        Err(err) => {
            send(writer, &domain_token(err)?).await?;
        }
    }
    Ok(Flow::Continue)
}

/// Single-line sale: a one-line cart through the same machinery as
/// `SELL_MULTI`.
async fn sell(
    state: &AppState,
    writer: &mut OwnedWriteHalf,
    branch: &str,
    sku: &str,
    qty: i64,
    customer_id: &str,
) -> ServerResult<Flow> {
    let Some(branch) = parse_branch(writer, branch).await? else {
        return Ok(Flow::Continue);
    };
    let Some(customer) = resolve_customer(state, writer, customer_id).await? else {
        return Ok(Flow::Continue);
    };

    let Some(product) = state.inventory.find_by_sku(branch, sku).await? else {
        send(writer, &format!("ERR SKU_NOT_FOUND {sku}")).await?;
        return Ok(Flow::Continue);
    };

    let lines = vec![CartLine {
        sku: sku.to_string(),
        qty,
        product,
    }];
    let quote = quote_cart(&lines, customer.tier);

    if let Err(err) = state
        .inventory
        .commit_sale(branch, &[(sku.to_string(), qty)])
        .await
    {
        send(writer, &domain_token(err)?).await?;
        return Ok(Flow::Continue);
    }
    state.customers.record_purchase(customer_id).await?;

    let gift_granted = grant_gift(state, branch, quote.gift_eligible).await?;

    let mut response =
        protocol::sale_header(quote.tier, quote.base_total, quote.discount, quote.final_total);
    push_gift_line(&mut response, quote.gift_eligible, gift_granted);
    response.push('\n');
    response.push_str(protocol::OK_END);
    send(writer, &response).await?;

    record_sale_audit(state, branch, &customer, &quote, gift_granted);
    Ok(Flow::Continue)
}

/// The cart transaction. Strict order, zero mutation before the atomic
/// stock commit succeeds.
async fn sell_multi(
    state: &AppState,
    writer: &mut OwnedWriteHalf,
    branch: &str,
    customer_id: &str,
    spec: &str,
) -> ServerResult<Flow> {
    // 1. branch, then cart spec (pure parse, no side effects)
    let Some(branch) = parse_branch(writer, branch).await? else {
        return Ok(Flow::Continue);
    };
    let requests = match parse_cart_spec(spec) {
        Ok(requests) => requests,
        Err(err) => {
            send(writer, cart_spec_token(&err)).await?;
            return Ok(Flow::Continue);
        }
    };

    // 2. customer
    let Some(customer) = resolve_customer(state, writer, customer_id).await? else {
        return Ok(Flow::Continue);
    };

    // 3. resolve every SKU, fail fast on the first unknown
    let mut lines = Vec::with_capacity(requests.len());
    for request in &requests {
        let Some(product) = state.inventory.find_by_sku(branch, &request.sku).await? else {
            send(writer, &format!("ERR SKU_NOT_FOUND {}", request.sku)).await?;
            return Ok(Flow::Continue);
        };
        lines.push(CartLine {
            sku: request.sku.clone(),
            qty: request.qty,
            product,
        });
    }

    // 4. quote (pure), 5. atomic all-or-nothing stock commit
    let quote = quote_cart(&lines, customer.tier);
    let committed: Vec<(String, i64)> = requests
        .iter()
        .map(|r| (r.sku.clone(), r.qty))
        .collect();
    if let Err(err) = state.inventory.commit_sale(branch, &committed).await {
        send(writer, &domain_token(err)?).await?;
        return Ok(Flow::Continue);
    }

    // 6. exactly one purchase recorded; promotion affects future sales
    state.customers.record_purchase(customer_id).await?;

    // 7. gift attempt, never rolls anything back
    let gift_granted = grant_gift(state, branch, quote.gift_eligible).await?;

    // 8. response: header, per-line breakdown, gift status, sentinel
    // (the header flag reports a granted gift, not mere eligibility)
    let mut response = protocol::sale_multi_header(
        quote.tier,
        quote.base_total,
        quote.discount,
        quote.final_total,
        gift_granted,
    );
    for line in &quote.lines {
        response.push('\n');
        response.push_str(&protocol::breakdown_line(line));
    }
    push_gift_line(&mut response, quote.gift_eligible, gift_granted);
    response.push('\n');
    response.push_str(protocol::OK_END);
    send(writer, &response).await?;

    // 9. audit, fire-and-forget
    record_sale_audit(state, branch, &customer, &quote, gift_granted);

    debug!(
        branch = %branch,
        customer_id = %customer.id,
        lines = quote.lines.len(),
        total = %quote.final_total,
        "cart sale served"
    );
    Ok(Flow::Continue)
}

async fn customer_add(
    state: &AppState,
    writer: &mut OwnedWriteHalf,
    id: &str,
    full_name: &str,
    phone: &str,
    tier: Option<&str>,
) -> ServerResult<Flow> {
    // a comma in any field would shift the columns of the stored row
    if [id, full_name, phone].iter().any(|field| field.contains(',')) {
        send(writer, "ERR BAD_ARGS").await?;
        return Ok(Flow::Continue);
    }

    let tier = tier.map(Tier::from_code).unwrap_or_default();
    match state.customers.add(id, full_name, phone, tier).await {
        Ok(_) => {
            state.audit.record(AuditEvent::CustomerAdded {
                customer_id: id.to_string(),
            });
            send(writer, protocol::OK_CUSTOMER_ADDED).await?;
        }
        Err(err) => {
            send(writer, &domain_token(err)?).await?;
        }
    }
    Ok(Flow::Continue)
}

async fn customer_list(state: &AppState, writer: &mut OwnedWriteHalf) -> ServerResult<Flow> {
    let customers = state.customers.list_all().await?;
    let mut response = String::new();
    for customer in &customers {
        response.push_str(&protocol::cust_line(customer));
        response.push('\n');
    }
    response.push_str(protocol::OK_END);
    send(writer, &response).await?;
    Ok(Flow::Continue)
}

// =============================================================================
// Shared Pieces
// =============================================================================

/// Writes one response (possibly multi-line) plus the trailing newline.
async fn send(writer: &mut OwnedWriteHalf, response: &str) -> std::io::Result<()> {
    writer.write_all(response.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    Ok(())
}

/// Parses a branch token, answering `ERR BAD_BRANCH` itself on failure.
async fn parse_branch(
    writer: &mut OwnedWriteHalf,
    token: &str,
) -> ServerResult<Option<Branch>> {
    match token.parse::<Branch>() {
        Ok(branch) => Ok(Some(branch)),
        Err(_) => {
            send(writer, "ERR BAD_BRANCH").await?;
            Ok(None)
        }
    }
}

/// Resolves a customer, answering `ERR CUSTOMER_NOT_FOUND` itself.
async fn resolve_customer(
    state: &AppState,
    writer: &mut OwnedWriteHalf,
    customer_id: &str,
) -> ServerResult<Option<Customer>> {
    match state.customers.find_by_id(customer_id).await? {
        Some(customer) => Ok(Some(customer)),
        None => {
            send(writer, "ERR CUSTOMER_NOT_FOUND").await?;
            Ok(None)
        }
    }
}

/// Attempts the gift unit when the quote earned one. `Ok(false)` means
/// promised-but-out-of-stock; the sale stands either way.
async fn grant_gift(
    state: &AppState,
    branch: Branch,
    eligible: bool,
) -> ServerResult<bool> {
    if !eligible {
        return Ok(false);
    }
    Ok(state
        .inventory
        .consume_one_in_category(branch, store_core::pricing::GIFT_CATEGORY)
        .await?)
}

fn push_gift_line(response: &mut String, eligible: bool, granted: bool) {
    if eligible {
        response.push('\n');
        response.push_str(if granted {
            protocol::GIFT_GRANTED
        } else {
            protocol::GIFT_OUT_OF_STOCK
        });
    }
}

fn record_sale_audit(
    state: &AppState,
    branch: Branch,
    customer: &Customer,
    quote: &store_core::CartQuote,
    gift_granted: bool,
) {
    state.audit.record(AuditEvent::SaleCompleted {
        branch: branch.to_string(),
        customer_id: customer.id.clone(),
        tier: quote.tier,
        base_total: quote.base_total,
        discount: quote.discount,
        final_total: quote.final_total,
        line_count: quote.lines.len(),
        gift_granted: quote.gift_eligible.then_some(gift_granted),
    });
}

/// Maps a store error to its wire token, or passes resource errors up
/// (those become `ERR INTERNAL` and tear the connection down).
fn domain_token(err: StoreDbError) -> Result<String, StoreDbError> {
    match err {
        StoreDbError::SkuNotFound { sku, .. } => Ok(format!("ERR SKU_NOT_FOUND {sku}")),
        StoreDbError::InsufficientStock { sku, .. } => {
            Ok(format!("ERR NOT_ENOUGH_STOCK {sku}"))
        }
        StoreDbError::CustomerNotFound(_) => Ok("ERR CUSTOMER_NOT_FOUND".to_string()),
        StoreDbError::CustomerExists(_) => Ok("ERR CUSTOMER_EXISTS".to_string()),
        other => Err(other),
    }
}

fn cart_spec_token(err: &CoreError) -> &'static str {
    match err {
        CoreError::EmptyCart => "ERR EMPTY_CART",
        CoreError::BadQuantity { .. } => "ERR BAD_QTY",
        _ => "ERR BAD_ITEM_SPEC",
    }
}
