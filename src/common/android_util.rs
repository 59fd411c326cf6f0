#![cfg(target_os = "android")]

use anyhow::Context;
use jni::objects::{JObject, JString, JValue};
use jni::{JNIEnv, JavaVM};
use std::path::PathBuf;

const J_STRING: &str = "()Ljava/lang/String;";
const J_FILE: &str = "()Ljava/io/File;";
const J_REQUEST: &str = "Landroid/app/DownloadManager$Request;";

const DOWNLOAD_REQUEST_CLASS: &str = "android/app/DownloadManager$Request";
const DOWNLOAD_QUERY_CLASS: &str = "android/app/DownloadManager$Query";
const APK_MIME_TYPE: &str = "application/vnd.android.package-archive";
const FLAG_ACTIVITY_NEW_TASK: i32 = 0x1000_0000;
const VISIBILITY_VISIBLE_NOTIFY_COMPLETED: i32 = 1;

/// see https://developer.android.com/reference/android/app/DownloadManager#STATUS_SUCCESSFUL
pub(crate) const STATUS_SUCCESSFUL: i32 = 8;
/// see https://developer.android.com/reference/android/app/DownloadManager#STATUS_FAILED
pub(crate) const STATUS_FAILED: i32 = 16;

/// One row of a `DownloadManager` query.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DownloadStatus {
    pub(crate) status: i32,
    pub(crate) reason: i32,
    pub(crate) downloaded: i64,
    pub(crate) total: i64,
}

pub(crate) struct AndroidUtil {
    ctx: JObject<'static>,
    vm: JavaVM,
}

impl AndroidUtil {
    pub(crate) fn create() -> anyhow::Result<AndroidUtil> {
        let ctx = ndk_context::android_context();
        let obj = unsafe { JObject::from_raw(ctx.context().cast()) };
        let vm = (unsafe { JavaVM::from_raw(ctx.vm().cast()) })
            .context("Could not get JavaVM from raw")?;
        Ok(AndroidUtil { ctx: obj, vm })
    }

    pub(crate) fn get_files_dir(&self) -> anyhow::Result<PathBuf> {
        self.with_env("get files dir", |env, ctx| {
            let dir = env.call_method(ctx, "getFilesDir", J_FILE, &[])?.l()?;
            Self::absolute_path(env, &dir)
        })
    }

    /// see https://developer.android.com/reference/android/os/Environment#getExternalStorageDirectory()
    pub(crate) fn get_external_storage_dir(&self) -> anyhow::Result<PathBuf> {
        self.with_env("get external storage dir", |env, _| {
            let dir = env
                .call_static_method("android/os/Environment", "getExternalStorageDirectory", J_FILE, &[])?
                .l()?;
            Self::absolute_path(env, &dir)
        })
    }

    /// see https://developer.android.com/reference/android/app/DownloadManager#enqueue(android.app.DownloadManager.Request)
    pub(crate) fn enqueue_download(
        &self,
        url: &str,
        destination: &str,
        title: &str,
        description: &str,
    ) -> anyhow::Result<i64> {
        self.with_env("enqueue download", |env, ctx| {
            let manager = Self::download_manager(env, ctx)?;
            let uri = Self::parse_uri(env, url)?;
            let request =
                env.new_object(DOWNLOAD_REQUEST_CLASS, "(Landroid/net/Uri;)V", &[JValue::from(&uri)])?;

            let title = env.new_string(title)?;
            let sig = format!("(Ljava/lang/CharSequence;){J_REQUEST}");
            env.call_method(&request, "setTitle", &sig, &[JValue::from(&title)])?;
            let description = env.new_string(description)?;
            env.call_method(&request, "setDescription", &sig, &[JValue::from(&description)])?;

            env.call_method(
                &request,
                "setNotificationVisibility",
                format!("(I){J_REQUEST}"),
                &[JValue::Int(VISIBILITY_VISIBLE_NOTIFY_COMPLETED)],
            )?;
            let destination_uri = Self::parse_uri(env, &format!("file://{destination}"))?;
            env.call_method(
                &request,
                "setDestinationUri",
                format!("(Landroid/net/Uri;){J_REQUEST}"),
                &[JValue::from(&destination_uri)],
            )?;

            env.call_method(&manager, "enqueue", format!("({J_REQUEST})J"), &[JValue::from(&request)])?
                .j()
        })
    }

    /// see https://developer.android.com/reference/android/app/DownloadManager#query(android.app.DownloadManager.Query)
    pub(crate) fn query_download(&self, id: i64) -> anyhow::Result<Option<DownloadStatus>> {
        self.with_env("query download", |env, ctx| {
            let manager = Self::download_manager(env, ctx)?;
            let query = env.new_object(DOWNLOAD_QUERY_CLASS, "()V", &[])?;
            let ids = env.new_long_array(1)?;
            env.set_long_array_region(&ids, 0, &[id])?;
            env.call_method(
                &query,
                "setFilterById",
                "([J)Landroid/app/DownloadManager$Query;",
                &[JValue::from(&ids)],
            )?;

            let cursor = env
                .call_method(
                    &manager,
                    "query",
                    "(Landroid/app/DownloadManager$Query;)Landroid/database/Cursor;",
                    &[JValue::from(&query)],
                )?
                .l()?;
            if cursor.is_null() {
                return Ok(None);
            }

            let status = if env.call_method(&cursor, "moveToFirst", "()Z", &[])?.z()? {
                Some(DownloadStatus {
                    status: Self::cursor_int(env, &cursor, "status")?,
                    reason: Self::cursor_int(env, &cursor, "reason")?,
                    downloaded: Self::cursor_long(env, &cursor, "bytes_so_far")?,
                    total: Self::cursor_long(env, &cursor, "total_size")?,
                })
            } else {
                None
            };
            env.call_method(&cursor, "close", "()V", &[])?;
            Ok(status)
        })
    }

    /// see https://developer.android.com/reference/android/content/Intent#ACTION_VIEW
    pub(crate) fn start_install_activity(&self, apk_path: &str) -> anyhow::Result<()> {
        self.with_env("start install activity", |env, ctx| {
            let uri = Self::parse_uri(env, &format!("file://{apk_path}"))?;
            let action = env.new_string("android.intent.action.VIEW")?;
            let intent = env.new_object(
                "android/content/Intent",
                "(Ljava/lang/String;)V",
                &[JValue::from(&action)],
            )?;
            let mime_type = env.new_string(APK_MIME_TYPE)?;
            env.call_method(
                &intent,
                "setDataAndType",
                "(Landroid/net/Uri;Ljava/lang/String;)Landroid/content/Intent;",
                &[JValue::from(&uri), JValue::from(&mime_type)],
            )?;
            env.call_method(
                &intent,
                "setFlags",
                "(I)Landroid/content/Intent;",
                &[JValue::Int(FLAG_ACTIVITY_NEW_TASK)],
            )?;
            env.call_method(
                ctx,
                "startActivity",
                "(Landroid/content/Intent;)V",
                &[JValue::from(&intent)],
            )?;
            Ok(())
        })
    }

    fn with_env<T, F>(&self, action: &str, f: F) -> anyhow::Result<T>
    where
        F: FnOnce(&mut JNIEnv, &JObject<'static>) -> jni::errors::Result<T>,
    {
        let mut env =
            self.vm.attach_current_thread().context("Failed to attach vm to current thread")?;
        let ctx = &self.ctx;
        env.with_local_frame(32, |env| f(env, ctx)).with_context(|| format!("Failed to {action}"))
    }

    fn download_manager<'local>(
        env: &mut JNIEnv<'local>,
        ctx: &JObject,
    ) -> jni::errors::Result<JObject<'local>> {
        let service_name = env.new_string("download")?;
        env.call_method(
            ctx,
            "getSystemService",
            "(Ljava/lang/String;)Ljava/lang/Object;",
            &[JValue::from(&service_name)],
        )?
        .l()
    }

    /// see https://developer.android.com/reference/android/net/Uri#parse(java.lang.String)
    fn parse_uri<'local>(env: &mut JNIEnv<'local>, url: &str) -> jni::errors::Result<JObject<'local>> {
        let url = env.new_string(url)?;
        env.call_static_method(
            "android/net/Uri",
            "parse",
            "(Ljava/lang/String;)Landroid/net/Uri;",
            &[JValue::from(&url)],
        )?
        .l()
    }

    fn absolute_path(env: &mut JNIEnv, file: &JObject) -> jni::errors::Result<PathBuf> {
        let path = JString::from(env.call_method(file, "getAbsolutePath", J_STRING, &[])?.l()?);
        let path: String = env.get_string(&path)?.into();
        Ok(PathBuf::from(path))
    }

    fn cursor_int(env: &mut JNIEnv, cursor: &JObject, column: &str) -> jni::errors::Result<i32> {
        let index = Self::column_index(env, cursor, column)?;
        env.call_method(cursor, "getInt", "(I)I", &[JValue::Int(index)])?.i()
    }

    fn cursor_long(env: &mut JNIEnv, cursor: &JObject, column: &str) -> jni::errors::Result<i64> {
        let index = Self::column_index(env, cursor, column)?;
        env.call_method(cursor, "getLong", "(I)J", &[JValue::Int(index)])?.j()
    }

    fn column_index(env: &mut JNIEnv, cursor: &JObject, column: &str) -> jni::errors::Result<i32> {
        let column = env.new_string(column)?;
        env.call_method(cursor, "getColumnIndex", "(Ljava/lang/String;)I", &[JValue::from(&column)])?
            .i()
    }
}
