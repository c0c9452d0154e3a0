// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// This file may not be copied, modified, or distributed except according to those terms.

use meshnode::*;

fn msg(sockid: &[u8], header: &[u8], content: &[u8]) -> Message {
    Message::init_data(Some(sockid), Some(header), Some(content))
}

#[test]
fn node_connect_triggers_register_at_the_bound_peer() {
    let _ = env_logger::try_init();
    let ctx = Context::new();

    // REGISTER/UNREGISTER chatter is a Node-to-Node concern: the bound
    // side here plays the "hub" role but is still a plain Node, not a
    // Router (Router's native addressing envelope is a different thing,
    // exercised separately below against a Dealer peer).
    let mut hub = ctx.new_node(NodeKind::Node).unwrap();
    hub.set_id(b"hub").unwrap();
    hub.bind("tcp://127.0.0.1:15601").unwrap();

    let mut node = ctx.new_node(NodeKind::Node).unwrap();
    node.set_id(b"node-a").unwrap();
    node.connect("tcp://127.0.0.1:15601").unwrap();

    let mut received = Message::init();
    hub.recvmsg(&mut received, 0).unwrap();

    assert_eq!(received.get(Part::Header), constants::REGISTER_VERB);
    assert_eq!(received.get(Part::Sockid), constants::SOCKID_NONE);
}

#[test]
fn node_disconnect_triggers_unregister_at_the_bound_peer() {
    let _ = env_logger::try_init();
    let ctx = Context::new();

    let mut hub = ctx.new_node(NodeKind::Node).unwrap();
    hub.bind("tcp://127.0.0.1:15602").unwrap();

    let mut node = ctx.new_node(NodeKind::Node).unwrap();
    node.set_id(b"node-b").unwrap();
    node.connect("tcp://127.0.0.1:15602").unwrap();

    let mut register = Message::init();
    hub.recvmsg(&mut register, 0).unwrap();
    assert_eq!(register.get(Part::Header), constants::REGISTER_VERB);

    node.disconnect().unwrap();

    let mut unregister = Message::init();
    hub.recvmsg(&mut unregister, 0).unwrap();
    assert_eq!(unregister.get(Part::Header), constants::UNREGISTER_VERB);
}

#[test]
#[should_panic]
fn expose_without_identity_is_a_programmer_error() {
    let _ = env_logger::try_init();
    let ctx = Context::new();
    let mut node = ctx.new_node(NodeKind::Node).unwrap();
    node.connect("tcp://127.0.0.1:15603").unwrap();
    let _ = node.expose();
}

#[test]
fn pub_sub_delivers_a_filtered_message() {
    let _ = env_logger::try_init();
    let ctx = Context::new();

    let mut publisher = ctx.new_node(NodeKind::Pub).unwrap();
    publisher.bind("tcp://127.0.0.1:15604").unwrap();

    let mut subscriber = ctx.new_node(NodeKind::Sub).unwrap();
    subscriber.set_filter(b"topic").unwrap();
    subscriber.connect("tcp://127.0.0.1:15604").unwrap();

    // allow the subscription to propagate before the publish
    std::thread::sleep(std::time::Duration::from_millis(200));

    let mut out = msg(b"topic", b"hdr", b"payload");
    publisher.sendmsg(&mut out).unwrap();

    let mut incoming = Message::init();
    subscriber.recvmsg_timeout(&mut incoming, 0, 1000).unwrap();

    assert_eq!(incoming.get(Part::Content), b"payload");
    assert_eq!(incoming.meta().unwrap().node_type, NodeKind::Pub as u8);
}

#[test]
fn router_dealer_exchange_request_and_reply() {
    let _ = env_logger::try_init();
    let ctx = Context::new();

    let mut router = ctx.new_node(NodeKind::Router).unwrap();
    router.bind("tcp://127.0.0.1:15605").unwrap();

    let mut dealer = ctx.new_node(NodeKind::Dealer).unwrap();
    dealer.set_id(b"client").unwrap();
    dealer.connect("tcp://127.0.0.1:15605").unwrap();

    let mut request = msg(b"", b"req", b"ping");
    dealer.sendmsg(&mut request).unwrap();

    let mut at_router = Message::init();
    router.recvmsg(&mut at_router, 0).unwrap();
    assert_eq!(at_router.get(Part::Sockid), b"client");
    assert_eq!(at_router.get(Part::Content), b"ping");

    let mut reply = msg(b"client", b"rep", b"pong");
    router.sendmsg(&mut reply).unwrap();

    let mut at_dealer = Message::init();
    dealer.recvmsg_timeout(&mut at_dealer, 0, 1000).unwrap();
    assert_eq!(at_dealer.get(Part::Content), b"pong");
}

#[test]
fn recvmsg_timeout_reports_timeout_when_nothing_arrives() {
    let _ = env_logger::try_init();
    let ctx = Context::new();
    let mut dealer = ctx.new_node(NodeKind::Dealer).unwrap();
    dealer.bind("tcp://127.0.0.1:15606").unwrap();

    let mut incoming = Message::init();
    let err = dealer.recvmsg_timeout(&mut incoming, 0, 100).unwrap_err();

    assert!(matches!(err, Error::Timeout));
}

#[test]
fn recvmsg_async_fires_timed_out_when_no_traffic_arrives() {
    let _ = env_logger::try_init();
    let ctx = Context::new();
    let mut dealer = ctx.new_node(NodeKind::Dealer).unwrap();
    dealer.bind("tcp://127.0.0.1:15607").unwrap();

    let fired = std::rc::Rc::new(std::cell::Cell::new(false));
    let fired_in_cb = fired.clone();
    dealer.recvmsg_async(100, move |_node, outcome| {
        fired_in_cb.set(true);
        assert!(matches!(outcome, RecvOutcome::TimedOut));
    });

    let deadline = std::time::Instant::now() + std::time::Duration::from_millis(500);
    while !fired.get() && std::time::Instant::now() < deadline {
        dealer.drive_async().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(10));
    }

    assert!(fired.get(), "async callback never fired");
}

#[test]
fn destroy_node_recycles_it_back_through_the_pool() {
    let _ = env_logger::try_init();
    let ctx = Context::new();

    let node = ctx.new_node(NodeKind::Sub).unwrap();
    ctx.destroy_node(node);

    let recycled = ctx.new_node(NodeKind::Sub).unwrap();
    assert_eq!(recycled.kind(), NodeKind::Sub);
}

#[test]
fn destroy_node_resets_connection_state_before_recycling() {
    let _ = env_logger::try_init();
    let ctx = Context::new();

    let mut hub = ctx.new_node(NodeKind::Node).unwrap();
    hub.bind("tcp://127.0.0.1:15608").unwrap();

    let mut node = ctx.new_node(NodeKind::Dealer).unwrap();
    node.connect("tcp://127.0.0.1:15608").unwrap();
    assert!(node.is_connected());

    ctx.destroy_node(node);

    // a fresh recycle of the same kind must come back pristine, or this
    // connect() would panic on the "already connected" precondition.
    let mut recycled = ctx.new_node(NodeKind::Dealer).unwrap();
    assert!(!recycled.is_connected());
    recycled.connect("tcp://127.0.0.1:15608").unwrap();
}
