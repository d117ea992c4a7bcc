//! End-to-end protocol tests: a real listener on an ephemeral port, a
//! real TCP client, seeded flat-file tables in a temp directory.

use std::net::SocketAddr;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};

use store_server::auth::sha256_hex;
use store_server::config::ServerConfig;
use store_server::server;

// =============================================================================
// Harness
// =============================================================================

struct TestServer {
    addr: SocketAddr,
    _dir: tempfile::TempDir,
}

/// Seeds the default fixture tables and starts a server on port 0.
async fn start_server() -> TestServer {
    start_server_with(
        &[
            "SKU1,SHIRT,HOLON,5,100.00",
            "SKU2,HAT,HOLON,3,110.00",
            "SKU3,SHIRT,TEL_AVIV,9,80.00",
        ],
        &[
            "C001,Avi Cohen,0501111111,VIP",
            "C002,Dana Levi,0502222222,NEW",
        ],
    )
    .await
}

async fn start_server_with(products: &[&str], customers: &[&str]) -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    std::fs::create_dir_all(&data_dir).unwrap();

    write_table(&data_dir.join("products.txt"), products);
    write_table(&data_dir.join("customers.txt"), customers);
    write_table(
        &data_dir.join("employees.txt"),
        &[&format!(
            "E1,alice,{},CASHIER,HOLON,1001,0501112222",
            sha256_hex("secret123")
        )],
    );

    let config = ServerConfig {
        port: 0,
        bind_addr: "127.0.0.1".to_string(),
        data_dir,
        log_dir: dir.path().join("logs"),
    };

    let state = server::build_state(&config);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server::serve(state, listener, std::future::pending::<()>()));

    TestServer { addr, _dir: dir }
}

fn write_table(path: &std::path::Path, rows: &[&str]) {
    let mut content = rows.join("\n");
    content.push('\n');
    std::fs::write(path, content).unwrap();
}

struct Client {
    reader: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Client {
    /// Connects and consumes the greeting.
    async fn connect(addr: SocketAddr) -> Client {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, writer) = stream.into_split();
        let mut client = Client {
            reader: BufReader::new(read_half).lines(),
            writer,
        };
        assert_eq!(client.recv().await, "OK WELCOME");
        client
    }

    async fn connect_and_login(addr: SocketAddr) -> Client {
        let mut client = Client::connect(addr).await;
        client.send("LOGIN admin admin admin").await;
        assert_eq!(client.recv().await, "OK LOGIN");
        client
    }

    async fn send(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
    }

    async fn recv(&mut self) -> String {
        self.reader.next_line().await.unwrap().unwrap()
    }

    /// Reads lines up to and including the `OK END` sentinel.
    async fn recv_until_end(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        loop {
            let line = self.recv().await;
            let done = line == "OK END";
            lines.push(line);
            if done {
                return lines;
            }
        }
    }
}

// =============================================================================
// Auth & Sessions
// =============================================================================

#[tokio::test]
async fn test_login_list_logout_flow() {
    let server = start_server().await;
    let mut client = Client::connect(server.addr).await;

    client.send("LOGIN alice secret123 employee").await;
    assert_eq!(client.recv().await, "OK LOGIN");

    client.send("LIST HOLON").await;
    let lines = client.recv_until_end().await;
    assert_eq!(
        lines,
        vec![
            "ITEM SKU1,SHIRT,HOLON,5,100.00",
            "ITEM SKU2,HAT,HOLON,3,110.00",
            "OK END",
        ]
    );

    client.send("LOGOUT").await;
    assert_eq!(client.recv().await, "OK BYE");
}

#[tokio::test]
async fn test_commands_require_login() {
    let server = start_server().await;
    let mut client = Client::connect(server.addr).await;

    client.send("LIST HOLON").await;
    assert_eq!(client.recv().await, "ERR NOT_LOGGED_IN");
    client.send("SELL_MULTI HOLON C001 SKU1:1").await;
    assert_eq!(client.recv().await, "ERR NOT_LOGGED_IN");

    // LOGOUT before login still closes politely
    client.send("LOGOUT").await;
    assert_eq!(client.recv().await, "OK BYE");
}

#[tokio::test]
async fn test_bad_credentials_rejected() {
    let server = start_server().await;
    let mut client = Client::connect(server.addr).await;

    client.send("LOGIN alice wrongpass employee").await;
    assert_eq!(client.recv().await, "ERR LOGIN INVALID_CREDENTIALS");
    client.send("LOGIN admin nope admin").await;
    assert_eq!(client.recv().await, "ERR LOGIN INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_duplicate_login_single_winner() {
    let server = start_server().await;

    let mut first = Client::connect(server.addr).await;
    first.send("LOGIN alice secret123 employee").await;
    assert_eq!(first.recv().await, "OK LOGIN");

    let mut second = Client::connect(server.addr).await;
    second.send("LOGIN alice secret123 employee").await;
    assert_eq!(second.recv().await, "ERR LOGIN ALREADY_CONNECTED");

    // after the first logs out, the name is free again
    first.send("LOGOUT").await;
    assert_eq!(first.recv().await, "OK BYE");

    second.send("LOGIN alice secret123 employee").await;
    assert_eq!(second.recv().await, "OK LOGIN");
}

#[tokio::test]
async fn test_disconnect_releases_session() {
    let server = start_server().await;

    {
        let mut first = Client::connect(server.addr).await;
        first.send("LOGIN alice secret123 employee").await;
        assert_eq!(first.recv().await, "OK LOGIN");
        // dropped without LOGOUT
    }

    // the handler releases the reservation on EOF; poll until it has
    let mut second = Client::connect(server.addr).await;
    for _ in 0..50 {
        second.send("LOGIN alice secret123 employee").await;
        if second.recv().await == "OK LOGIN" {
            return;
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
    }
    panic!("session was never released after disconnect");
}

// =============================================================================
// Inventory
// =============================================================================

#[tokio::test]
async fn test_buy_orders_stock() {
    let server = start_server().await;
    let mut client = Client::connect_and_login(server.addr).await;

    client.send("BUY HOLON SKU1 7").await;
    assert_eq!(client.recv().await, "OK BUY");

    client.send("LIST HOLON").await;
    let lines = client.recv_until_end().await;
    assert!(lines.contains(&"ITEM SKU1,SHIRT,HOLON,12,100.00".to_string()));
}

#[tokio::test]
async fn test_buy_rejects_bad_quantity_and_unknown_sku() {
    let server = start_server().await;
    let mut client = Client::connect_and_login(server.addr).await;

    client.send("BUY HOLON SKU1 zero").await;
    assert_eq!(client.recv().await, "ERR BAD_QTY");
    client.send("BUY HOLON SKU1 -3").await;
    assert_eq!(client.recv().await, "ERR BAD_QTY");
    client.send("BUY HOLON GHOST 1").await;
    assert_eq!(client.recv().await, "ERR SKU_NOT_FOUND GHOST");
    client.send("BUY NOWHERE SKU1 1").await;
    assert_eq!(client.recv().await, "ERR BAD_BRANCH");
}

#[tokio::test]
async fn test_list_is_idempotent() {
    let server = start_server().await;
    let mut client = Client::connect_and_login(server.addr).await;

    client.send("LIST TEL_AVIV").await;
    let first = client.recv_until_end().await;
    client.send("LIST TEL_AVIV").await;
    let second = client.recv_until_end().await;
    assert_eq!(first, second);
    assert_eq!(first[0], "ITEM SKU3,SHIRT,TEL_AVIV,9,80.00");
}

// =============================================================================
// Cart Sales
// =============================================================================

#[tokio::test]
async fn test_sell_multi_vip_worked_example() {
    let server = start_server().await;
    let mut client = Client::connect_and_login(server.addr).await;

    // VIP, base 310.00, 12% discount 37.20, final 272.80 (< 300, no gift)
    client.send("SELL_MULTI HOLON C001 SKU1:2,SKU2:1").await;
    let lines = client.recv_until_end().await;
    assert_eq!(
        lines,
        vec![
            "OK SALE_MULTI VIP 310.00 37.20 272.80",
            "LINE SKU1 SHIRT 2 100.00 200.00 24.00 176.00",
            "LINE SKU2 HAT 1 110.00 110.00 13.20 96.80",
            "OK END",
        ]
    );

    // stock decremented exactly
    client.send("LIST HOLON").await;
    let listing = client.recv_until_end().await;
    assert!(listing.contains(&"ITEM SKU1,SHIRT,HOLON,3,100.00".to_string()));
    assert!(listing.contains(&"ITEM SKU2,HAT,HOLON,2,110.00".to_string()));
}

#[tokio::test]
async fn test_sell_multi_new_customer_no_discount() {
    let server = start_server().await;
    let mut client = Client::connect_and_login(server.addr).await;

    client.send("SELL_MULTI HOLON C002 SKU1:1").await;
    let lines = client.recv_until_end().await;
    assert_eq!(
        lines,
        vec![
            "OK SALE_MULTI NEW 100.00 0.00 100.00",
            "LINE SKU1 SHIRT 1 100.00 100.00 0.00 100.00",
            "OK END",
        ]
    );
}

#[tokio::test]
async fn test_sell_multi_vip_gift_granted() {
    let server = start_server_with(
        &["SKU1,SHIRT,HOLON,10,200.00"],
        &["C001,Avi Cohen,0501111111,VIP"],
    )
    .await;
    let mut client = Client::connect_and_login(server.addr).await;

    // base 400.00, discount 48.00, final 352.00 >= 300 -> gift
    client.send("SELL_MULTI HOLON C001 SKU1:2").await;
    let lines = client.recv_until_end().await;
    assert_eq!(
        lines,
        vec![
            "OK SALE_MULTI VIP 400.00 48.00 352.00 GIFT",
            "LINE SKU1 SHIRT 2 200.00 400.00 48.00 352.00",
            "GIFT_SHIRT 1",
            "OK END",
        ]
    );

    // sale took 2, gift took 1 more from the cheapest shirt
    client.send("LIST HOLON").await;
    let listing = client.recv_until_end().await;
    assert!(listing.contains(&"ITEM SKU1,SHIRT,HOLON,7,200.00".to_string()));
}

#[tokio::test]
async fn test_sell_multi_gift_out_of_stock_never_fails_sale() {
    // exactly enough shirts for the cart, none left for the gift
    let server = start_server_with(
        &["SKU1,SHIRT,HOLON,2,200.00"],
        &["C001,Avi Cohen,0501111111,VIP"],
    )
    .await;
    let mut client = Client::connect_and_login(server.addr).await;

    client.send("SELL_MULTI HOLON C001 SKU1:2").await;
    let lines = client.recv_until_end().await;
    // no GIFT flag in the header: the gift was earned but not granted
    assert_eq!(lines[0], "OK SALE_MULTI VIP 400.00 48.00 352.00");
    assert_eq!(lines[2], "GIFT_SHIRT_OUT_OF_STOCK");
}

#[tokio::test]
async fn test_sell_multi_all_or_nothing() {
    let server = start_server().await;
    let mut client = Client::connect_and_login(server.addr).await;

    // SKU2 only has 3 in stock; the whole cart must be refused
    client.send("SELL_MULTI HOLON C001 SKU1:1,SKU2:5").await;
    assert_eq!(client.recv().await, "ERR NOT_ENOUGH_STOCK SKU2");

    client.send("LIST HOLON").await;
    let listing = client.recv_until_end().await;
    assert!(listing.contains(&"ITEM SKU1,SHIRT,HOLON,5,100.00".to_string()));
    assert!(listing.contains(&"ITEM SKU2,HAT,HOLON,3,110.00".to_string()));
}

#[tokio::test]
async fn test_sell_multi_error_tokens() {
    let server = start_server().await;
    let mut client = Client::connect_and_login(server.addr).await;

    client.send("SELL_MULTI NOWHERE C001 SKU1:1").await;
    assert_eq!(client.recv().await, "ERR BAD_BRANCH");
    client.send("SELL_MULTI HOLON C001 ,,").await;
    assert_eq!(client.recv().await, "ERR EMPTY_CART");
    client.send("SELL_MULTI HOLON C001 SKU1-2").await;
    assert_eq!(client.recv().await, "ERR BAD_ITEM_SPEC");
    client.send("SELL_MULTI HOLON C001 SKU1:0").await;
    assert_eq!(client.recv().await, "ERR BAD_QTY");
    client.send("SELL_MULTI HOLON C999 SKU1:1").await;
    assert_eq!(client.recv().await, "ERR CUSTOMER_NOT_FOUND");
    client.send("SELL_MULTI HOLON C001 GHOST:1").await;
    assert_eq!(client.recv().await, "ERR SKU_NOT_FOUND GHOST");
}

#[tokio::test]
async fn test_sell_single_line() {
    let server = start_server().await;
    let mut client = Client::connect_and_login(server.addr).await;

    client.send("SELL HOLON SKU2 1 C002").await;
    let lines = client.recv_until_end().await;
    assert_eq!(lines, vec!["OK SALE NEW 110.00 0.00 110.00", "OK END"]);

    client.send("LIST HOLON").await;
    let listing = client.recv_until_end().await;
    assert!(listing.contains(&"ITEM SKU2,HAT,HOLON,2,110.00".to_string()));
}

#[tokio::test]
async fn test_purchases_promote_tier_for_future_sales_only() {
    let server = start_server_with(
        &["SKU1,SHIRT,HOLON,50,10.00"],
        &["C5,Noa Bar,0529999999,NEW"],
    )
    .await;
    let mut client = Client::connect_and_login(server.addr).await;

    // first purchase quotes at NEW
    client.send("SELL_MULTI HOLON C5 SKU1:1").await;
    let lines = client.recv_until_end().await;
    assert_eq!(lines[0], "OK SALE_MULTI NEW 10.00 0.00 10.00");

    // second purchase still quotes at NEW (count was 1 when quoting)
    client.send("SELL_MULTI HOLON C5 SKU1:1").await;
    let lines = client.recv_until_end().await;
    assert_eq!(lines[0], "OK SALE_MULTI NEW 10.00 0.00 10.00");

    // third purchase sees the RETURNING promotion earned by the second
    client.send("SELL_MULTI HOLON C5 SKU1:1").await;
    let lines = client.recv_until_end().await;
    assert_eq!(lines[0], "OK SALE_MULTI RETURNING 10.00 0.50 9.50");
}

#[tokio::test]
async fn test_huge_quantities_rejected_and_session_survives() {
    let server = start_server().await;
    let mut client = Client::connect_and_login(server.addr).await;

    // qty × price would overflow i64 cents if it ever reached the math
    client.send("SELL HOLON SKU1 92233720368547758 C001").await;
    assert_eq!(client.recv().await, "ERR BAD_QTY");
    client.send("SELL_MULTI HOLON C001 SKU1:92233720368547758").await;
    assert_eq!(client.recv().await, "ERR BAD_QTY");
    client.send("BUY HOLON SKU1 9223372036854775807").await;
    assert_eq!(client.recv().await, "ERR BAD_QTY");

    // the connection and its reservation are intact: commands still
    // work, and the username is still held against duplicate logins
    client.send("LIST HOLON").await;
    assert_eq!(*client.recv_until_end().await.last().unwrap(), "OK END");

    let mut second = Client::connect(server.addr).await;
    second.send("LOGIN admin admin admin").await;
    assert_eq!(second.recv().await, "ERR LOGIN ALREADY_CONNECTED");
}

// =============================================================================
// Customers
// =============================================================================

#[tokio::test]
async fn test_customer_add_and_list() {
    let server = start_server().await;
    let mut client = Client::connect_and_login(server.addr).await;

    client.send("CUSTOMER_ADD C9 Rona_Ben_David 0507654321").await;
    assert_eq!(client.recv().await, "OK CUSTOMER_ADDED");

    client.send("CUSTOMER_ADD C9 Someone_Else 0500000000").await;
    assert_eq!(client.recv().await, "ERR CUSTOMER_EXISTS");

    client.send("CUSTOMER_LIST").await;
    let lines = client.recv_until_end().await;
    assert!(lines.contains(&"CUST C9,Rona Ben David,0507654321,NEW".to_string()));
    assert!(lines.contains(&"CUST C001,Avi Cohen,0501111111,VIP".to_string()));
}

#[tokio::test]
async fn test_customer_add_rejects_comma_fields() {
    let server = start_server().await;
    let mut client = Client::connect_and_login(server.addr).await;

    // a comma inside a field would shift the stored CSV columns
    client.send("CUSTOMER_ADD C9 Levi,Dana 0501234567").await;
    assert_eq!(client.recv().await, "ERR BAD_ARGS");
    client.send("CUSTOMER_ADD C9 Dana_Levi 050,123").await;
    assert_eq!(client.recv().await, "ERR BAD_ARGS");
    client.send("CUSTOMER_ADD C,9 Dana_Levi 0501234567").await;
    assert_eq!(client.recv().await, "ERR BAD_ARGS");

    // nothing was stored
    client.send("CUSTOMER_LIST").await;
    let lines = client.recv_until_end().await;
    assert!(!lines.iter().any(|l| l.contains("C9")));
}

// =============================================================================
// Protocol Robustness
// =============================================================================

#[tokio::test]
async fn test_unknown_command_keeps_connection_open() {
    let server = start_server().await;
    let mut client = Client::connect_and_login(server.addr).await;

    client.send("FROBNICATE now").await;
    assert_eq!(client.recv().await, "ERR UNKNOWN_CMD");
    client.send("LIST HOLON").await;
    let lines = client.recv_until_end().await;
    assert_eq!(*lines.last().unwrap(), "OK END");
}

#[tokio::test]
async fn test_blank_lines_are_ignored() {
    let server = start_server().await;
    let mut client = Client::connect_and_login(server.addr).await;

    client.send("").await;
    client.send("   ").await;
    client.send("LIST HOLON").await;
    let lines = client.recv_until_end().await;
    assert_eq!(*lines.last().unwrap(), "OK END");
}
