//! JNI entry points for the managed Android host.
//!
//! The symbol names bind to the `coronet.android.CoronetLib` class; its
//! `static native` methods are the other half of this file. Everything
//! funnels into the shared C ABI, so the JNI layer stays a thin rename.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr::NonNull;
use std::sync::Arc;

use jni::objects::{JClass, JObject};
use jni::sys::jint;
use jni::JNIEnv;
use log::{info, warn};

use coronet_fs::ApkFs;

use crate::exports;
use crate::slot;

/// Resolves the platform asset manager behind the Java `AssetManager`
/// and installs it as the bundle source for the next init.
#[no_mangle]
pub extern "system" fn Java_coronet_android_CoronetLib_initAssetManager(
    env: JNIEnv,
    _class: JClass,
    manager: JObject,
) {
    crate::logging::init();
    let _ = catch_unwind(AssertUnwindSafe(|| {
        if manager.as_raw().is_null() {
            warn!(target: "bridge", "bridge.asset_manager null object");
            return;
        }

        let raw = unsafe { ndk_sys::AAssetManager_fromJava(env.get_raw() as *mut _, manager.as_raw() as _) };
        match NonNull::new(raw) {
            Some(ptr) => {
                // Safety: the pointer comes from AAssetManager_fromJava
                // on a live AssetManager the Java side keeps referenced
                // for the process lifetime.
                let fs = unsafe { ApkFs::from_raw(ptr) };
                slot::install_bundle_fs(Arc::new(fs));
                info!(target: "bridge", "bridge.asset_manager installed");
            }
            None => warn!(target: "bridge", "bridge.asset_manager resolve failed"),
        }
    }));
}

#[no_mangle]
pub extern "system" fn Java_coronet_android_CoronetLib_pushEvent(
    _env: JNIEnv,
    _class: JClass,
    kind: jint,
    a: jint,
    b: jint,
    c: jint,
    d: jint,
) {
    exports::coronet_push_event(kind, a, b, c, d);
}

#[no_mangle]
pub extern "system" fn Java_coronet_android_CoronetLib_init(_env: JNIEnv, _class: JClass) -> jint {
    exports::coronet_init()
}

#[no_mangle]
pub extern "system" fn Java_coronet_android_CoronetLib_frame(_env: JNIEnv, _class: JClass) -> jint {
    exports::coronet_frame()
}

#[no_mangle]
pub extern "system" fn Java_coronet_android_CoronetLib_shutdown(
    _env: JNIEnv,
    _class: JClass,
) -> jint {
    exports::coronet_shutdown()
}

#[no_mangle]
pub extern "system" fn Java_coronet_android_CoronetLib_pause(_env: JNIEnv, _class: JClass) {
    exports::coronet_pause();
}

#[no_mangle]
pub extern "system" fn Java_coronet_android_CoronetLib_unpause(_env: JNIEnv, _class: JClass) {
    exports::coronet_unpause();
}

#[no_mangle]
pub extern "system" fn Java_coronet_android_CoronetLib_isInit(_env: JNIEnv, _class: JClass) -> jint {
    exports::coronet_is_init()
}

#[no_mangle]
pub extern "system" fn Java_coronet_android_CoronetLib_isRunning(
    _env: JNIEnv,
    _class: JClass,
) -> jint {
    exports::coronet_is_running()
}

#[no_mangle]
pub extern "system" fn Java_coronet_android_CoronetLib_isPaused(
    _env: JNIEnv,
    _class: JClass,
) -> jint {
    exports::coronet_is_paused()
}
