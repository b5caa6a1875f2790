//! One function per verb. Each enforces its auth precondition first and
//! leaves state untouched on any error. See SPEC_FULL.md §4.4.

use farm_core::model::FARM_GROUP;
use farm_core::{SessionStore, StoreError};
use tokio::sync::mpsc::UnboundedSender;

use crate::broker::{arduino_topic, client_topic, Broker};
use crate::command::Command;
use crate::connection::ConnectionState;
use crate::errors::{AuthError, NotFoundError};
use crate::reply::Reply;

/// Dispatch a parsed command to its handler.
///
/// `outbound` is this connection's own send channel, used only by
/// `sign_in`/`new_user` to subscribe the connection to its topic.
pub fn handle(
    store: &dyn SessionStore,
    broker: &Broker,
    conn: &mut ConnectionState,
    outbound: &UnboundedSender<String>,
    command: Command,
) -> Reply {
    match command {
        Command::NewUser { login, password } => new_user(store, broker, conn, outbound, &login, &password),
        Command::SignIn { login, password } => sign_in(store, broker, conn, outbound, &login, &password),
        Command::SignOut => sign_out(store, broker, conn),
        Command::NewFarm {
            farm_id,
            farm_password,
        } => new_farm(store, conn, &farm_id, &farm_password),
        Command::ConnectFarm {
            farm_id,
            farm_password,
        } => connect_farm(store, conn, &farm_id, &farm_password),
        Command::DisconnectFarm => disconnect_farm(store, conn),
        Command::SetTemperature { temp } => publish_control(
            store,
            broker,
            conn,
            "set_temperature",
            format!("set_temperature {temp}"),
        ),
        Command::SetHumidity { value } => publish_control(
            store,
            broker,
            conn,
            "set_humidity",
            format!("set_humidity {value}"),
        ),
        Command::SetLightInterval { start, end } => publish_control(
            store,
            broker,
            conn,
            "set_light_interval",
            format!("set_light_interval {start} {end}"),
        ),
        Command::SetPumpInterval { start, end } => publish_control(
            store,
            broker,
            conn,
            "set_pump_interval",
            format!("set_pump_interval {start} {end}"),
        ),
    }
}

fn sign_in_and_subscribe(
    store: &dyn SessionStore,
    broker: &Broker,
    conn: &mut ConnectionState,
    outbound: &UnboundedSender<String>,
    login: &str,
    password: &str,
) -> Result<i64, Reply> {
    let user = match store.check_password(login, password) {
        Ok(Some(user)) => user,
        Ok(None) => return Err(Reply::failure("sign_in", "Wrong login or password!")),
        Err(e) => return Err(Reply::failure("sign_in", e)),
    };
    let session = match store.create_session(user.id) {
        Ok(s) => s,
        Err(e) => return Err(Reply::failure("sign_in", e)),
    };
    if conn.bind(user.id, session).is_err() {
        // Precondition was already checked by the caller; unreachable
        // in practice, but leaves no half-bound state if it ever isn't.
        let _ = store.delete_session(session);
        return Err(Reply::failure("sign_in", AuthError::AlreadySignedIn));
    }

    let is_farm = matches!(store.is_in_group(user.id, FARM_GROUP), Ok(true));
    let topic = if is_farm {
        arduino_topic(session)
    } else {
        client_topic(session)
    };
    let handle = broker.subscribe(topic.clone(), outbound.clone());
    conn.subscription = Some((topic, handle));

    Ok(session)
}

fn new_user(
    store: &dyn SessionStore,
    broker: &Broker,
    conn: &mut ConnectionState,
    outbound: &UnboundedSender<String>,
    login: &str,
    password: &str,
) -> Reply {
    if conn.is_signed_in() {
        return Reply::failure("new_user", AuthError::AlreadySignedIn);
    }
    match store.create_user(login, password) {
        Ok(_) => match sign_in_and_subscribe(store, broker, conn, outbound, login, password) {
            Ok(session) => Reply::success_with("sign_in", session),
            Err(reply) => reply,
        },
        Err(StoreError::UserAlreadyExists) => Reply::failure("new_user", "User already exist!"),
        Err(e) => Reply::failure("new_user", e),
    }
}

fn sign_in(
    store: &dyn SessionStore,
    broker: &Broker,
    conn: &mut ConnectionState,
    outbound: &UnboundedSender<String>,
    login: &str,
    password: &str,
) -> Reply {
    if conn.is_signed_in() {
        return Reply::failure("sign_in", AuthError::AlreadySignedIn);
    }
    match sign_in_and_subscribe(store, broker, conn, outbound, login, password) {
        Ok(session) => Reply::success_with("sign_in", session),
        Err(reply) => reply,
    }
}

fn sign_out(store: &dyn SessionStore, broker: &Broker, conn: &mut ConnectionState) -> Reply {
    if !conn.is_signed_in() {
        return Reply::failure("sign_out", AuthError::NotSignedIn);
    }
    if conn.is_farm_attached() {
        if let Err(reply) = disconnect_farm_inner(store, conn) {
            return reply;
        }
    }
    if let Some((topic, handle)) = conn.subscription.take() {
        broker.unsubscribe(&topic, handle);
    }
    match conn.unbind() {
        Ok(session) => {
            if let Err(e) = store.delete_session(session) {
                tracing::warn!(error = %e, "failed to delete session during sign_out");
            }
            Reply::success("sign_out")
        }
        Err(e) => Reply::failure("sign_out", e),
    }
}

fn new_farm(
    store: &dyn SessionStore,
    conn: &mut ConnectionState,
    farm_id: &str,
    farm_password: &str,
) -> Reply {
    if !conn.is_signed_in() {
        return Reply::failure("new_farm", AuthError::NotSignedIn);
    }
    if conn.is_farm_attached() {
        return Reply::failure("new_farm", AuthError::FarmAlreadyAttached);
    }
    let owner = conn.user.expect("checked is_signed_in above");
    let farm_name = format!("farm_{farm_id}");
    match store.new_farm(owner, &farm_name, farm_password) {
        Ok(_) => connect_farm(store, conn, farm_id, farm_password),
        Err(StoreError::UserAlreadyExists) => Reply::failure("new_farm", "Farm already exist!"),
        Err(e) => Reply::failure("new_farm", e),
    }
}

fn connect_farm(
    store: &dyn SessionStore,
    conn: &mut ConnectionState,
    farm_id: &str,
    farm_password: &str,
) -> Reply {
    if !conn.is_signed_in() {
        return Reply::failure("connect_farm", AuthError::NotSignedIn);
    }
    if conn.is_farm_attached() {
        return Reply::failure("connect_farm", AuthError::FarmAlreadyAttached);
    }
    let farm_name = format!("farm_{farm_id}");
    let farm_user = match store.check_password(&farm_name, farm_password) {
        Ok(Some(user)) => user,
        Ok(None) => return Reply::failure("connect_farm", NotFoundError::FarmNotFound),
        Err(e) => return Reply::failure("connect_farm", e),
    };
    match store.is_in_group(farm_user.id, FARM_GROUP) {
        Ok(true) => {}
        Ok(false) => return Reply::failure("connect_farm", AuthError::NotAFarm),
        Err(e) => return Reply::failure("connect_farm", e),
    }
    let session = match store.create_session(farm_user.id) {
        Ok(s) => s,
        Err(e) => return Reply::failure("connect_farm", e),
    };
    if let Err(auth_err) = conn.attach_farm(session) {
        let _ = store.delete_session(session);
        return Reply::failure("connect_farm", auth_err);
    }
    Reply::success_with("connect_farm", session)
}

fn disconnect_farm_inner(store: &dyn SessionStore, conn: &mut ConnectionState) -> Result<(), Reply> {
    let session = conn
        .detach_farm()
        .map_err(|e| Reply::failure("disconnect_farm", e))?;
    if let Err(e) = store.delete_session(session) {
        return Err(Reply::failure("disconnect_farm", e));
    }
    Ok(())
}

fn disconnect_farm(store: &dyn SessionStore, conn: &mut ConnectionState) -> Reply {
    if !conn.is_signed_in() {
        return Reply::failure("disconnect_farm", AuthError::NotSignedIn);
    }
    if !conn.is_farm_attached() {
        return Reply::failure("disconnect_farm", AuthError::NoFarmAttached);
    }
    match disconnect_farm_inner(store, conn) {
        Ok(()) => Reply::success("disconnect_farm"),
        Err(reply) => reply,
    }
}

/// Forward a device-control verb to the attached farm.
///
/// Routes via the farm's *current* live session rather than the session
/// id captured at `connect_farm` time: the physical farm device's own
/// `sign_in` creates a session independent of that one, and only the
/// device's own session is ever subscribed to an `arduino_` topic. See
/// SPEC_FULL.md §9 open question #6.
fn publish_control(
    store: &dyn SessionStore,
    broker: &Broker,
    conn: &ConnectionState,
    verb: &'static str,
    message: String,
) -> Reply {
    if !conn.is_signed_in() {
        return Reply::failure(verb, AuthError::NotSignedIn);
    }
    if conn.farm_session.is_none() {
        return Reply::failure(verb, AuthError::NoFarmAttached);
    }
    let owner = conn.user.expect("checked is_signed_in above");
    let farm_user_id = match store.owned_farm(owner) {
        Ok(Some(farm)) => farm.farm_id,
        Ok(None) => return Reply::failure(verb, AuthError::NoFarmAttached),
        Err(e) => return Reply::failure(verb, e),
    };
    match store.active_session(farm_user_id) {
        Ok(Some(live_session)) => {
            broker.publish(&arduino_topic(live_session), message);
            Reply::success(verb)
        }
        Ok(None) => Reply::failure(verb, NotFoundError::FarmNotFound),
        Err(e) => Reply::failure(verb, e),
    }
}
