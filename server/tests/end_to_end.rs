//! End-to-end scenarios from SPEC_FULL.md §8, exercised against the
//! handler layer directly (no live socket needed — the WebSocket loop
//! is a thin wrapper around these same calls).

use farm_core::SqliteStore;
use farm_server::broker::Broker;
use farm_server::command::Command;
use farm_server::connection::ConnectionState;
use farm_server::handlers::handle;
use tokio::sync::mpsc::unbounded_channel;

#[test]
fn fresh_user_signs_up_and_is_signed_in() {
    let store = SqliteStore::open_in_memory().unwrap();
    let broker = Broker::new();
    let mut conn = ConnectionState::new();
    let (tx, _rx) = unbounded_channel();

    let reply = handle(
        &store,
        &broker,
        &mut conn,
        &tx,
        Command::NewUser {
            login: "alice".into(),
            password: "hunter2".into(),
        },
    );

    assert_eq!(reply.to_string(), "sign_in success 1");
    assert!(conn.is_signed_in());
}

#[test]
fn duplicate_user_is_rejected_without_mutating_store() {
    let store = SqliteStore::open_in_memory().unwrap();
    let broker = Broker::new();
    let mut conn = ConnectionState::new();
    let (tx, _rx) = unbounded_channel();

    handle(
        &store,
        &broker,
        &mut conn,
        &tx,
        Command::NewUser {
            login: "alice".into(),
            password: "hunter2".into(),
        },
    );

    let mut other = ConnectionState::new();
    let (tx2, _rx2) = unbounded_channel();
    let reply = handle(
        &store,
        &broker,
        &mut other,
        &tx2,
        Command::NewUser {
            login: "alice".into(),
            password: "does-not-matter".into(),
        },
    );

    assert_eq!(reply.to_string(), "new_user error User already exist!");
    assert!(!other.is_signed_in());
}

#[test]
fn create_and_attach_a_farm() {
    let store = SqliteStore::open_in_memory().unwrap();
    let broker = Broker::new();
    let mut conn = ConnectionState::new();
    let (tx, _rx) = unbounded_channel();

    handle(
        &store,
        &broker,
        &mut conn,
        &tx,
        Command::NewUser {
            login: "alice".into(),
            password: "hunter2".into(),
        },
    );
    let reply = handle(
        &store,
        &broker,
        &mut conn,
        &tx,
        Command::NewFarm {
            farm_id: "F01".into(),
            farm_password: "farmpass".into(),
        },
    );

    assert_eq!(reply.to_string(), "connect_farm success 2");
    assert_eq!(conn.farm_session, Some(2));
    let farm = store.owned_farm(1).unwrap().unwrap();
    assert_eq!((farm.user_id, farm.farm_id), (1, 2));
}

#[test]
fn command_forwarded_to_attached_farm_exactly_once() {
    let store = SqliteStore::open_in_memory().unwrap();
    let broker = Broker::new();

    let mut client = ConnectionState::new();
    let (client_tx, _client_rx) = unbounded_channel();
    handle(
        &store,
        &broker,
        &mut client,
        &client_tx,
        Command::NewUser {
            login: "alice".into(),
            password: "hunter2".into(),
        },
    );
    handle(
        &store,
        &broker,
        &mut client,
        &client_tx,
        Command::NewFarm {
            farm_id: "F01".into(),
            farm_password: "farmpass".into(),
        },
    );

    let mut farm = ConnectionState::new();
    let (farm_tx, mut farm_rx) = unbounded_channel();
    handle(
        &store,
        &broker,
        &mut farm,
        &farm_tx,
        Command::SignIn {
            login: "farm_F01".into(),
            password: "farmpass".into(),
        },
    );

    let reply = handle(
        &store,
        &broker,
        &mut client,
        &client_tx,
        Command::SetTemperature { temp: 22.5 },
    );

    assert_eq!(reply.to_string(), "set_temperature success");
    assert_eq!(farm_rx.try_recv().unwrap(), "set_temperature 22.5");
    assert!(farm_rx.try_recv().is_err(), "message must be delivered exactly once");
}

#[test]
fn farm_to_client_reverse_path_resolves_via_store() {
    // Exercises the store-level half of the farm-origin relay that
    // `ws::relay_from_farm` performs at the socket layer: resolve the
    // farm's owner, then the owner's live session, to know which
    // client_<session> topic to publish on.
    let store = SqliteStore::open_in_memory().unwrap();
    let broker = Broker::new();

    let mut client = ConnectionState::new();
    let (client_tx, mut client_rx) = unbounded_channel();
    handle(
        &store,
        &broker,
        &mut client,
        &client_tx,
        Command::NewUser {
            login: "alice".into(),
            password: "hunter2".into(),
        },
    );
    handle(
        &store,
        &broker,
        &mut client,
        &client_tx,
        Command::NewFarm {
            farm_id: "F01".into(),
            farm_password: "farmpass".into(),
        },
    );

    let farm_user_id = store.check_password("farm_F01", "farmpass").unwrap().unwrap().id;
    let owner = store.farm_owner(farm_user_id).unwrap().unwrap();
    let owner_session = store.active_session(owner).unwrap().unwrap();
    broker.publish(
        &farm_server::broker::client_topic(owner_session),
        "reading 21.9",
    );

    assert_eq!(client_rx.try_recv().unwrap(), "reading 21.9");
}

#[test]
fn clean_disconnect_cascade_on_close() {
    let store = SqliteStore::open_in_memory().unwrap();
    let broker = Broker::new();

    let mut client = ConnectionState::new();
    let (client_tx, _client_rx) = unbounded_channel();
    handle(
        &store,
        &broker,
        &mut client,
        &client_tx,
        Command::NewUser {
            login: "alice".into(),
            password: "hunter2".into(),
        },
    );
    handle(
        &store,
        &broker,
        &mut client,
        &client_tx,
        Command::NewFarm {
            farm_id: "F01".into(),
            farm_password: "farmpass".into(),
        },
    );

    let mut farm = ConnectionState::new();
    let (farm_tx, _farm_rx) = unbounded_channel();
    handle(
        &store,
        &broker,
        &mut farm,
        &farm_tx,
        Command::SignIn {
            login: "farm_F01".into(),
            password: "farmpass".into(),
        },
    );

    // Simulate socket close on the client side: the transport layer
    // runs an implicit sign_out.
    handle(&store, &broker, &mut client, &client_tx, Command::SignOut);

    assert_eq!(store.session_user(1).unwrap(), None);
    assert_eq!(store.session_user(2).unwrap(), None);
    // The farm's own session (a separate sign-in, session 3) is untouched.
    assert_eq!(store.session_user(3).unwrap(), Some(farm.user.unwrap()));
}
