mod common;

use std::time::Duration;

use bcos_rpc::bcos_core::{Address, FilterQuery, H256};
use bcos_rpc::{RpcError, Transport};
use common::{connect, header};
use serde_json::{json, Value};

#[tokio::test]
async fn concurrent_calls_match_out_of_order_replies() {
    let (_transport, client, mut node) = connect(1, 8);

    let mut calls = Vec::new();
    for n in 0..16u64 {
        let c = client.clone();
        calls.push(tokio::spawn(async move {
            (n, c.block_by_number(n, false).await)
        }));
    }

    let mut requests = Vec::new();
    for _ in 0..16 {
        requests.push(node.next_request().await);
    }
    for req in requests.iter().rev() {
        assert_eq!(req["method"], "getBlockByNumber");
        assert_eq!(req["params"][0], json!(1));
        let number = req["params"][1].clone();
        node.reply(&req["id"], json!({ "number": number })).await;
    }

    for call in calls {
        let (n, block) = call.await.unwrap();
        let block = block.unwrap();
        assert_eq!(block["number"], json!(format!("{n:#x}")));
    }
}

#[tokio::test]
async fn batched_replies_are_unpacked() {
    let (_transport, client, mut node) = connect(1, 8);

    let a = tokio::spawn({
        let c = client.clone();
        async move { c.pbft_view().await }
    });
    let b = tokio::spawn({
        let c = client.clone();
        async move { c.pending_tx_size().await }
    });

    let first = node.next_request().await;
    let second = node.next_request().await;
    let reply_for = |req: &Value| {
        let result = if req["method"] == "getPbftView" { "0x9" } else { "0x3" };
        json!({"jsonrpc": "2.0", "id": req["id"], "result": result})
    };
    node.send(json!([reply_for(&second), reply_for(&first)])).await;

    assert_eq!(a.await.unwrap().unwrap(), 9);
    assert_eq!(b.await.unwrap().unwrap(), 3);
}

#[tokio::test]
async fn remote_error_is_surfaced() {
    let (_transport, client, mut node) = connect(1, 8);

    let call = tokio::spawn(async move { client.sealer_list().await });
    let req = node.next_request().await;
    node.reply_error(&req["id"], -40001, "GroupID does not exist").await;

    match call.await.unwrap() {
        Err(RpcError::Remote { code, message, .. }) => {
            assert_eq!(code, -40001);
            assert_eq!(message, "GroupID does not exist");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn null_receipt_is_not_found() {
    let (_transport, client, mut node) = connect(1, 8);

    let call = tokio::spawn(async move { client.transaction_receipt(H256([4; 32])).await });
    let req = node.next_request().await;
    assert_eq!(req["method"], "eth_getTransactionReceipt");
    node.reply(&req["id"], Value::Null).await;

    assert!(call.await.unwrap().unwrap_err().is_not_found());
}

#[tokio::test]
async fn reply_without_result_is_not_found() {
    let (transport, client, mut node) = connect(1, 8);

    let call = tokio::spawn(async move { client.transaction_receipt(H256([5; 32])).await });
    let req = node.next_request().await;
    node.send(json!({"jsonrpc": "2.0", "id": req["id"]})).await;

    assert!(call.await.unwrap().unwrap_err().is_not_found());
    assert_eq!(transport.pending_requests(), 0);
}

#[tokio::test]
async fn invalid_filter_is_rejected_before_sending() {
    let (_transport, client, mut node) = connect(1, 8);

    let query = FilterQuery::new()
        .address(Address([1; 20]))
        .at_block_hash(H256([2; 32]))
        .to_block(100u64);
    assert!(matches!(
        client.filter_logs(&query).await,
        Err(RpcError::Validation(_))
    ));
    tokio::task::yield_now().await;
    node.assert_idle();
}

#[tokio::test]
async fn timed_out_call_releases_entry_and_ignores_late_reply() {
    let (transport, client, mut node) = connect(1, 8);
    let impatient = client.clone().with_timeout(Some(Duration::from_millis(50)));

    let err = {
        let call = impatient.block_number();
        let (result, req) = tokio::join!(call, node.next_request());
        assert_eq!(req["method"], "getBlockNumber");
        node.reply(&req["id"], json!("0x1")).await;
        result.unwrap_err()
    };
    assert!(matches!(err, RpcError::Timeout(_)));
    assert_eq!(transport.pending_requests(), 0);

    let call = tokio::spawn(async move { client.block_number().await });
    let req = node.next_request().await;
    node.reply(&req["id"], json!("0x2")).await;
    assert_eq!(call.await.unwrap().unwrap(), 2);
}

#[tokio::test]
async fn new_heads_arrive_in_order() {
    let (transport, client, mut node) = connect(1, 4);

    let subscribe = tokio::spawn(async move { client.subscribe_new_head().await });
    let req = node.next_request().await;
    assert_eq!(req["method"], "eth_subscribe");
    assert_eq!(req["params"], json!(["newHeads"]));
    node.reply(&req["id"], json!("0xabc")).await;
    // Notifications follow the confirmation immediately.
    for n in 1..=3 {
        node.notify("0xabc", header(n)).await;
    }

    let mut heads = subscribe.await.unwrap().unwrap();
    assert_eq!(heads.id(), "0xabc");
    for n in 1..=3 {
        assert_eq!(heads.next().await.unwrap().unwrap().number, n);
    }
    assert_eq!(transport.active_subscriptions(), 1);
}

#[tokio::test]
async fn slow_consumer_loses_nothing() {
    let (_transport, client, mut node) = connect(1, 1);

    let subscribe = tokio::spawn(async move { client.subscribe_new_head().await });
    let req = node.next_request().await;
    node.reply(&req["id"], json!("0x1")).await;
    let mut heads = subscribe.await.unwrap().unwrap();

    let producer = tokio::spawn(async move {
        for n in 0..20 {
            node.notify("0x1", header(n)).await;
        }
        node
    });
    for n in 0..20 {
        assert_eq!(heads.next().await.unwrap().unwrap().number, n);
    }
    producer.await.unwrap();
}

#[tokio::test]
async fn unsubscribe_cancels_on_node_and_closes_stream() {
    let (transport, client, mut node) = connect(1, 4);

    let logs = tokio::spawn({
        let c = client.clone();
        async move { c.subscribe_filter_logs(&FilterQuery::new()).await }
    });
    let req = node.next_request().await;
    assert_eq!(req["params"][0], json!("logs"));
    assert_eq!(req["params"][1]["fromBlock"], json!("0x0"));
    assert_eq!(req["params"][1]["toBlock"], json!("latest"));
    node.reply(&req["id"], json!("0x7")).await;
    let sub = logs.await.unwrap().unwrap();

    let cancel = tokio::spawn(async move { sub.unsubscribe().await });
    let req = node.next_request().await;
    assert_eq!(req["method"], "eth_unsubscribe");
    assert_eq!(req["params"], json!(["0x7"]));
    node.reply(&req["id"], json!(true)).await;
    cancel.await.unwrap().unwrap();
    assert_eq!(transport.active_subscriptions(), 0);

    // Stragglers for the cancelled id are dropped without disturbing calls.
    node.notify("0x7", json!({"address": format!("0x{}", "11".repeat(20))}))
        .await;
    let call = tokio::spawn(async move { client.pbft_view().await });
    let req = node.next_request().await;
    node.reply(&req["id"], json!(5)).await;
    assert_eq!(call.await.unwrap().unwrap(), 5);
}

#[tokio::test]
async fn unsubscribe_releases_reader_stuck_on_full_queue() {
    let (transport, client, mut node) = connect(1, 1);

    let subscribe = tokio::spawn({
        let c = client.clone();
        async move { c.subscribe_new_head().await }
    });
    let req = node.next_request().await;
    node.reply(&req["id"], json!("0x9")).await;
    let heads = subscribe.await.unwrap().unwrap();

    // The first fills the queue; the reader parks on the second.
    node.notify("0x9", header(1)).await;
    node.notify("0x9", header(2)).await;
    tokio::task::yield_now().await;

    let cancel = tokio::spawn(heads.unsubscribe());
    let req = node.next_request().await;
    assert_eq!(req["method"], "eth_unsubscribe");
    assert_eq!(req["params"], json!(["0x9"]));
    node.reply(&req["id"], json!(true)).await;

    tokio::time::timeout(Duration::from_secs(2), cancel)
        .await
        .expect("unsubscribe reply was never read")
        .unwrap()
        .unwrap();
    assert_eq!(transport.active_subscriptions(), 0);
    node.assert_idle();

    let call = tokio::spawn(async move { client.pbft_view().await });
    let req = node.next_request().await;
    node.reply(&req["id"], json!(3)).await;
    assert_eq!(call.await.unwrap().unwrap(), 3);
}

#[tokio::test]
async fn dropped_stream_is_cancelled_on_next_notification() {
    let (transport, client, mut node) = connect(1, 4);

    let subscribe = tokio::spawn(async move { client.subscribe_new_head().await });
    let req = node.next_request().await;
    node.reply(&req["id"], json!("0x5")).await;
    drop(subscribe.await.unwrap().unwrap());

    node.notify("0x5", header(1)).await;
    let req = node.next_request().await;
    assert_eq!(req["method"], "eth_unsubscribe");
    assert_eq!(req["params"], json!(["0x5"]));
    assert_eq!(transport.active_subscriptions(), 0);
}

#[tokio::test]
async fn close_ends_every_stream_once() {
    let (transport, client, mut node) = connect(1, 4);

    let mut streams = Vec::new();
    for id in ["0xa", "0xb"] {
        let c = client.clone();
        let subscribe = tokio::spawn(async move { c.subscribe_new_head().await });
        let req = node.next_request().await;
        node.reply(&req["id"], json!(id)).await;
        streams.push(subscribe.await.unwrap().unwrap());
    }

    let pending = tokio::spawn({
        let c = client.clone();
        async move { c.block_number().await }
    });
    node.next_request().await;

    client.close();
    client.close();
    assert!(transport.is_closed());
    assert!(matches!(pending.await.unwrap(), Err(RpcError::Closed)));
    for mut stream in streams {
        assert!(stream.next().await.is_none());
        assert!(stream.next().await.is_none());
    }
    assert!(matches!(client.block_number().await, Err(RpcError::Closed)));
    assert!(node.request_or_hangup().await.is_none());
}

#[tokio::test]
async fn node_hangup_fails_pending_calls() {
    let (transport, client, mut node) = connect(1, 4);

    let call = tokio::spawn(async move { client.peers().await });
    node.next_request().await;
    node.hang_up();

    assert!(matches!(call.await.unwrap(), Err(RpcError::Closed)));
    assert!(transport.is_closed());
}

#[tokio::test]
async fn malformed_frames_are_skipped() {
    let (_transport, client, mut node) = connect(1, 4);

    let call = tokio::spawn(async move { client.block_number().await });
    let req = node.next_request().await;
    node.send_text("not json").await;
    node.send(json!({"jsonrpc": "2.0", "method": "somethingElse"})).await;
    node.reply(&req["id"], json!("0x10")).await;
    assert_eq!(call.await.unwrap().unwrap(), 16);
}
