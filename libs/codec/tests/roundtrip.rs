//! Round-trip coverage across the full message registry: for every type,
//! `parse(marshal(m)) == m` with minimal and maximal field sets, plus the
//! canonical wire-array shapes for the common control flows.

use wamp_codec::messages::*;
use wamp_codec::{decode, Message, MessageType, Serializer, WampMessage};
use wamp_types::{
    ClientRole, ClientRoleMap, Dict, PayloadEncAlgo, PayloadSerializerId, Principal,
    RoleFeatures, RouterRole, RouterRoleMap, Uri, Value, WampId,
};

fn id(raw: u64) -> WampId {
    WampId::try_new(raw).unwrap()
}

fn uri(s: &str) -> Uri {
    Uri::unchecked(s)
}

fn roundtrip(message: Message) {
    let wire = message.marshal();
    assert_eq!(
        Message::parse(&wire).expect("parse of own marshal"),
        message,
        "array round-trip failed for {}",
        message.name()
    );
}

fn client_roles() -> ClientRoleMap {
    let mut roles = ClientRoleMap::new();
    roles.insert(ClientRole::Caller, RoleFeatures::default());
    roles.insert(ClientRole::Subscriber, RoleFeatures::default());
    roles
}

fn router_roles() -> RouterRoleMap {
    let mut roles = RouterRoleMap::new();
    roles.insert(RouterRole::Broker, RoleFeatures::default());
    roles.insert(RouterRole::Dealer, RoleFeatures::default());
    roles
}

fn forward_hop() -> Principal {
    Principal::new(id(33), Some("intermediary".into()), "router")
}

#[test]
fn session_lifecycle_minimal() {
    roundtrip(Message::Hello(Hello::new(Some(uri("realm1")), client_roles())));
    roundtrip(Message::Hello(Hello::new(None, client_roles())));
    roundtrip(Message::Welcome(Welcome::new(id(42), router_roles())));
    roundtrip(Message::Abort(Abort::new(uri("wamp.error.no_such_realm"))));
    roundtrip(Message::Challenge(Challenge::new("wampcra", Dict::new())));
    roundtrip(Message::Authenticate(Authenticate::new("sig", Dict::new())));
    roundtrip(Message::Goodbye(Goodbye::normal()));
}

#[test]
fn session_lifecycle_maximal() {
    let mut hello = Hello::new(Some(uri("com.example.realm")), client_roles());
    hello.authmethods = Some(vec!["wampcra".into(), "cryptosign".into()]);
    hello.authid = Some("alice".into());
    hello.authrole = Some("user".into());
    hello.authextra = Some([("pubkey".to_string(), Value::from("ab12"))].into());
    hello.resumable = Some(true);
    hello.custom.insert("x_client".into(), Value::from("demo/1.0"));
    roundtrip(Message::Hello(hello));

    let mut welcome = Welcome::new(id(9_007_199_254_740_992), router_roles());
    welcome.realm = Some(uri("com.example.realm"));
    welcome.authid = Some("alice".into());
    welcome.authrole = Some("user".into());
    welcome.authmethod = Some("wampcra".into());
    welcome.authprovider = Some("static".into());
    roundtrip(Message::Welcome(welcome));

    let mut goodbye = Goodbye::with_reason(uri("wamp.close.system_shutdown"));
    goodbye.message = Some("maintenance window".into());
    roundtrip(Message::Goodbye(goodbye));
}

#[test]
fn pubsub_control_types() {
    let mut subscribe = Subscribe::new(id(713845233), uri("com.myapp.topic1"));
    subscribe.get_retained = Some(true);
    roundtrip(Message::Subscribe(subscribe));
    roundtrip(Message::Subscribed(Subscribed::new(id(713845233), id(5512315355))));

    let mut unsubscribe = Unsubscribe::new(id(85346237), id(5512315355));
    unsubscribe.forward_for = vec![forward_hop()];
    roundtrip(Message::Unsubscribe(unsubscribe));

    roundtrip(Message::Unsubscribed(Unsubscribed::reply(id(85346237))));
    roundtrip(Message::Unsubscribed(Unsubscribed::revocation(
        id(5512315355),
        Some(uri("wamp.close.normal")),
    )));
    roundtrip(Message::Published(Published::new(id(239714735), id(4429313566))));
}

#[test]
fn rpc_control_types() {
    let mut register = Register::new(id(25349185), uri("com.myapp.echo"));
    register.force_reregister = Some(true);
    roundtrip(Message::Register(register));
    roundtrip(Message::Registered(Registered::new(id(25349185), id(2103333224))));

    let mut unregister = Unregister::new(id(788923562), id(2103333224));
    unregister.forward_for = vec![forward_hop()];
    roundtrip(Message::Unregister(unregister));

    roundtrip(Message::Unregistered(Unregistered::reply(id(788923562))));
    roundtrip(Message::Cancel(Cancel::new(id(7814135), None)));
    roundtrip(Message::Interrupt(Interrupt::new(
        id(7814135),
        Some(wamp_types::CancelMode::Kill),
    )));
    roundtrip(Message::EventReceived(EventReceived::new(id(4429313566))));
}

#[test]
fn data_plane_args_and_kwargs_modes() {
    let args = AppPayload::structured(Some(vec![Value::from("Hello, world!")]), None);
    let both = AppPayload::structured(
        Some(vec![Value::Integer(1)]),
        Some([("mode".to_string(), Value::from("sync"))].into()),
    );

    roundtrip(Message::Publish(Publish::new(
        id(239714735),
        uri("com.myapp.topic1"),
        args.clone(),
    )));
    roundtrip(Message::Event(Event::new(id(5512315355), id(4429313566), both.clone())));
    roundtrip(Message::Call(Call::new(id(7814135), uri("com.myapp.ping"), AppPayload::default())));
    roundtrip(Message::Result(CallResult::new(id(7814135), args.clone())));
    roundtrip(Message::Invocation(Invocation::new(id(6131533), id(9823526), both)));
    roundtrip(Message::Yield(Yield::new(id(6131533), args)));
}

#[test]
fn data_plane_opaque_payload_mode() {
    let opaque = AppPayload::opaque(
        vec![0x01, 0x02, 0x03, 0x04],
        Some(PayloadEncAlgo::Cryptobox),
        Some("base64-pubkey".into()),
        Some(PayloadSerializerId::Msgpack),
    );

    roundtrip(Message::Publish(Publish::new(
        id(239714735),
        uri("com.myapp.secret"),
        opaque.clone(),
    )));
    roundtrip(Message::Event(Event::new(id(1), id(2), opaque.clone())));
    roundtrip(Message::Yield(Yield::new(id(6131533), opaque)));
}

#[test]
fn call_scenario_exact_wire_shape() {
    let call = Call::new(
        id(123),
        uri("com.example.add"),
        AppPayload::structured(Some(vec![Value::Integer(2), Value::Integer(3)]), None),
    );
    let wire = call.marshal();
    assert_eq!(
        wire,
        vec![
            Value::Integer(48),
            Value::Integer(123),
            Value::Dict(Dict::new()),
            Value::from("com.example.add"),
            Value::List(vec![Value::Integer(2), Value::Integer(3)]),
        ]
    );
    assert_eq!(Message::parse(&wire).unwrap(), Message::Call(call));
}

#[test]
fn error_scenario_exact_wire_shape() {
    let error = Error::new(
        MessageType::Call,
        id(123),
        uri("wamp.error.no_such_procedure"),
        AppPayload::default(),
    );
    assert_eq!(
        error.marshal(),
        vec![
            Value::Integer(8),
            Value::Integer(48),
            Value::Integer(123),
            Value::Dict(Dict::new()),
            Value::from("wamp.error.no_such_procedure"),
        ]
    );
}

#[test]
fn revocation_unregistered_scenario() {
    let revocation = Unregistered::revocation(id(77), Some(uri("wamp.close.normal")));
    let wire = revocation.marshal();
    assert_eq!(wire[0], Value::Integer(67));
    assert_eq!(wire[1], Value::Integer(0));
    let details = wire[2].as_dict().unwrap();
    assert_eq!(details.get("registration"), Some(&Value::Integer(77)));
    assert_eq!(Unregistered::parse(&wire).unwrap(), revocation);
}

#[test]
fn forward_for_survives_every_data_plane_type() {
    let chain = vec![forward_hop(), Principal::new(id(34), None, "router")];

    let mut call = Call::new(id(1), uri("com.example.echo"), AppPayload::default());
    call.forward_for = chain.clone();
    roundtrip(Message::Call(call));

    let mut publish = Publish::new(id(2), uri("com.example.topic"), AppPayload::default());
    publish.forward_for = chain.clone();
    roundtrip(Message::Publish(publish));

    let mut error = Error::new(
        MessageType::Publish,
        id(3),
        uri("wamp.error.not_authorized"),
        AppPayload::default(),
    );
    error.forward_for = chain;
    roundtrip(Message::Error(error));
}

#[test]
fn every_serializer_roundtrips_a_mixed_batch() {
    let batch = vec![
        Message::Hello(Hello::new(Some(uri("realm1")), client_roles())),
        Message::Subscribe(Subscribe::new(id(1), uri("com.a.b"))),
        Message::Call(Call::new(
            id(2),
            uri("com.example.add"),
            AppPayload::structured(Some(vec![Value::Integer(2), Value::Integer(3)]), None),
        )),
        Message::Yield(Yield::new(
            id(2),
            AppPayload::opaque(vec![9, 8, 7], Some(PayloadEncAlgo::Mqtt), None, None),
        )),
        Message::Goodbye(Goodbye::normal()),
    ];

    let serializers = [
        Serializer::Json,
        Serializer::Msgpack,
        Serializer::Cbor,
        Serializer::Binary {
            payload: PayloadSerializerId::Cbor,
        },
        Serializer::Binary {
            payload: PayloadSerializerId::Msgpack,
        },
    ];

    for message in batch {
        let wrapped = WampMessage::new(message);
        for serializer in &serializers {
            let bytes = wrapped.serialize(serializer).unwrap();
            let received = decode(&bytes, serializer).unwrap();
            assert_eq!(received, wrapped, "{} via {}", wrapped.body().name(), serializer.id());
        }
    }
}
