//! Preload reconfiguration flows driven through `DeviceTools`

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use device_registry::{LocalRegistry, SimpleDevice};
use device_sync::testing::{ManualClock, ScriptedShell};
use device_sync::{DeviceTools, SyncConfig};

const CAT: &str = "cat /etc/preloaded-classes";
const BOOT_QUERY: &str = "getprop dev.bootcomplete";

fn tools(
    registry: Arc<LocalRegistry>,
    shell: &Arc<ScriptedShell>,
    clock: &Arc<ManualClock>,
) -> DeviceTools {
    DeviceTools::builder()
        .registry(registry)
        .executor(Arc::clone(shell) as _)
        .clock(Arc::clone(clock) as _)
        .config(SyncConfig::default())
        .build()
        .unwrap()
}

#[test]
fn test_already_empty_file_skips_reboot() {
    let shell = Arc::new(ScriptedShell::new());
    let clock = Arc::new(ManualClock::new());
    shell.reply(CAT, "\r\n");
    let tools = tools(Arc::new(LocalRegistry::new()), &shell, &clock);

    assert!(tools.remove_preloaded(&SimpleDevice::new("a"), Duration::from_secs(10)));
    assert_eq!(shell.commands(), vec![CAT.to_string()]);
    assert_eq!(shell.timeouts(), vec![Duration::from_secs(1)]);
    assert!(clock.sleeps().is_empty());
}

#[test]
fn test_full_sequence_until_boot_completes() {
    let shell = Arc::new(ScriptedShell::new());
    let clock = Arc::new(ManualClock::new());
    shell.reply(CAT, "java.lang.Object\njava.lang.String\n");
    shell.queue(BOOT_QUERY, Ok("0\r\n"));
    shell.queue(BOOT_QUERY, Ok("\r\n"));
    shell.reply(BOOT_QUERY, "1\r\n");
    let tools = tools(Arc::new(LocalRegistry::new()), &shell, &clock);

    assert!(tools.remove_preloaded(&SimpleDevice::new("a"), Duration::from_secs(60)));

    assert_eq!(
        shell.commands(),
        vec![
            CAT,
            "stop",
            "mount -o remount,rw /system",
            "rm /etc/preloaded-classes",
            "touch /etc/preloaded-classes",
            "rm /data/dalvik-cache/*/*boot.art",
            "setprop dev.bootcomplete \"0\"",
            "start",
            BOOT_QUERY,
            BOOT_QUERY,
            BOOT_QUERY,
        ]
    );

    let ms = Duration::from_millis;
    assert_eq!(
        shell.timeouts(),
        vec![
            ms(1000),
            ms(100),
            ms(500),
            ms(100),
            ms(100),
            ms(500),
            ms(500),
            ms(100),
            ms(500),
            ms(500),
            ms(500),
        ]
    );
    assert_eq!(clock.sleeps(), vec![Duration::from_secs(1); 3]);
}

#[test]
fn test_boot_that_never_completes_reports_false() {
    let shell = Arc::new(ScriptedShell::new());
    let clock = Arc::new(ManualClock::new());
    shell.reply(CAT, "java.lang.Object\n");
    shell.reply(BOOT_QUERY, "0\r\n");
    let tools = tools(Arc::new(LocalRegistry::new()), &shell, &clock);

    assert!(!tools.remove_preloaded(&SimpleDevice::new("a"), Duration::from_secs(5)));
    assert!(shell.count(BOOT_QUERY) <= 5);
    assert_eq!(clock.elapsed(), Duration::from_secs(5));
}

#[test]
fn test_find_then_reconfigure() {
    let registry = Arc::new(LocalRegistry::new());
    let shell = Arc::new(ScriptedShell::new());
    let clock = Arc::new(ManualClock::new());
    shell.reply(CAT, "java.lang.Object\n");
    shell.reply(BOOT_QUERY, "1");
    let tools = tools(Arc::clone(&registry), &shell, &clock);

    let producer = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            registry.connect("emulator-5554").unwrap();
            registry.set_has_clients("emulator-5554", true).unwrap();
        })
    };

    let device = tools
        .find_device("emulator-5554", Duration::from_secs(5))
        .expect("device should connect");
    producer.join().unwrap();
    assert!(device.has_clients());

    assert!(tools.remove_preloaded(device.as_ref(), Duration::from_secs(5)));
    assert_eq!(shell.commands_for("emulator-5554").len(), 9);
    assert_eq!(shell.count(BOOT_QUERY), 1);
}
