use std::sync::{
	atomic::{AtomicI32, Ordering::Relaxed},
	Arc, Mutex,
};

use chime::{Connection, ScopedConnection, Signal};

use _recorder::Recorder;

#[test]
fn default_connections_are_unconnected() {
	let mut connection = Connection::default();
	assert!(!connection.connected());
	connection.disconnect();
	assert!(!connection.connected());
}

#[test]
fn disconnect_is_idempotent() {
	let ping: Signal<fn()> = Signal::new();
	let counter = Arc::new(AtomicI32::new(0));
	let mut connection = ping.connect({
		let counter = Arc::clone(&counter);
		move || {
			counter.fetch_add(1, Relaxed);
		}
	});
	assert!(connection.connected());

	ping.emit(());
	assert_eq!(counter.load(Relaxed), 1);

	for _ in 0..3 {
		connection.disconnect();
		assert!(!connection.connected());
	}
	ping.emit(());
	assert_eq!(counter.load(Relaxed), 1);
}

#[test]
fn scoped_connections_disconnect_at_scope_exit() {
	let value_changed: Signal<fn(i32)> = Signal::new();

	let value1 = Arc::new(AtomicI32::new(0));
	let value2 = Arc::new(AtomicI32::new(0));
	let value3 = Arc::new(AtomicI32::new(0));
	{
		let _conn1 = ScopedConnection::from(value_changed.connect({
			let value1 = Arc::clone(&value1);
			move |value: i32| value1.store(value, Relaxed)
		}));
		{
			let _conn2 = ScopedConnection::from(value_changed.connect({
				let value2 = Arc::clone(&value2);
				move |value: i32| value2.store(value, Relaxed)
			}));
			value_changed.connect({
				let value3 = Arc::clone(&value3);
				move |value: i32| value3.store(value, Relaxed)
			});

			value_changed.emit(10);
			assert_eq!(value1.load(Relaxed), 10);
			assert_eq!(value2.load(Relaxed), 10);
			assert_eq!(value3.load(Relaxed), 10);
		}

		// conn2 disconnected.
		value_changed.emit(-99);
		assert_eq!(value1.load(Relaxed), -99);
		assert_eq!(value2.load(Relaxed), 10);
		assert_eq!(value3.load(Relaxed), -99);
	}

	// conn1 disconnected.
	value_changed.emit(17);
	assert_eq!(value1.load(Relaxed), -99);
	assert_eq!(value2.load(Relaxed), 10);
	assert_eq!(value3.load(Relaxed), 17);
}

#[test]
fn released_connections_survive_the_scope() {
	let ping: Signal<fn()> = Signal::new();
	let counter = Arc::new(AtomicI32::new(0));

	let mut released = {
		let scoped = ScopedConnection::from(ping.connect({
			let counter = Arc::clone(&counter);
			move || {
				counter.fetch_add(1, Relaxed);
			}
		}));
		scoped.release()
	};

	ping.emit(());
	assert_eq!(counter.load(Relaxed), 1);

	released.disconnect();
	ping.emit(());
	assert_eq!(counter.load(Relaxed), 1);
}

#[test]
fn overwriting_a_scoped_connection_disconnects_the_old_slot() {
	let ping: Signal<fn()> = Signal::new();
	let counter = Arc::new(AtomicI32::new(0));
	let bump = {
		let counter = Arc::clone(&counter);
		move || {
			counter.fetch_add(1, Relaxed);
		}
	};

	let mut scoped = ScopedConnection::from(ping.connect(bump.clone()));
	assert_eq!(ping.slot_count(), 1);

	scoped = ScopedConnection::from(ping.connect(bump));
	assert_eq!(ping.slot_count(), 1);

	ping.emit(());
	assert_eq!(counter.load(Relaxed), 1);
	drop(scoped);
	assert_eq!(ping.slot_count(), 0);
}

#[test]
fn disconnecting_outlived_connections_is_harmless() {
	let mut conn2;
	{
		let mut conn1 = ScopedConnection::default();
		{
			let value_changed: Signal<fn(i32)> = Signal::new();
			conn2 = value_changed.connect(|_value: i32| {});
			// Deliberately never bound to a handle.
			value_changed.connect(|_value: i32| {});
			conn1 = ScopedConnection::from(value_changed.connect(|_value: i32| {}));
		}
		conn2.disconnect();
		assert!(conn1.connected());
	}
	conn2.disconnect();
}

#[test]
fn slots_can_disconnect_themselves_mid_emission() {
	let value_changed: Signal<fn(i32)> = Signal::new();
	let recorder = Recorder::new();

	value_changed.connect({
		let recorder = recorder.clone();
		move |value: i32| recorder.push(("first", value))
	});
	let own_connection = Arc::new(Mutex::new(Connection::default()));
	let conn2 = value_changed.connect({
		let recorder = recorder.clone();
		let own_connection = Arc::clone(&own_connection);
		move |value: i32| {
			recorder.push(("second", value));
			own_connection.lock().unwrap().disconnect();
		}
	});
	*own_connection.lock().unwrap() = conn2;
	value_changed.connect({
		let recorder = recorder.clone();
		move |value: i32| recorder.push(("third", value))
	});

	// The self-disconnecting slot still lets the rest of this emission run.
	value_changed.emit(63);
	recorder.expect([("first", 63), ("second", 63), ("third", 63)]);

	value_changed.emit(101);
	recorder.expect([("first", 101), ("third", 101)]);
}

#[test]
fn slots_disconnected_before_their_turn_do_not_run() {
	let value_changed: Signal<fn(i32)> = Signal::new();
	let recorder = Recorder::new();

	let victim = Arc::new(Mutex::new(Connection::default()));
	value_changed.connect({
		let recorder = recorder.clone();
		let victim = Arc::clone(&victim);
		move |value: i32| {
			recorder.push(("first", value));
			victim.lock().unwrap().disconnect();
		}
	});
	let conn2 = value_changed.connect({
		let recorder = recorder.clone();
		move |value: i32| recorder.push(("second", value))
	});
	*victim.lock().unwrap() = conn2;

	value_changed.emit(5);
	recorder.expect([("first", 5)]);
}

#[test]
fn slots_connected_mid_emission_run_from_the_next_emission_on() {
	let value_changed: Signal<fn(i32)> = Signal::new();
	let recorder = Recorder::new();

	let signal_handle = value_changed.clone();
	let connected_late = Arc::new(AtomicI32::new(0));
	value_changed.connect({
		let recorder = recorder.clone();
		let connected_late = Arc::clone(&connected_late);
		move |value: i32| {
			recorder.push(("first", value));
			if connected_late.fetch_add(1, Relaxed) == 0 {
				let recorder = recorder.clone();
				signal_handle.connect(move |value: i32| recorder.push(("late", value)));
			}
		}
	});

	value_changed.emit(1);
	recorder.expect([("first", 1)]);

	value_changed.emit(2);
	recorder.expect([("first", 2), ("late", 2)]);
}
