use jitloader_core::{
    ConfigHandle, ConfigurationBuilder, DirectoryAssets, LibraryLoader, LoadedLibrary,
    LoaderContext, LoaderError, LoaderResult, LoaderSettings, MemoryAssets, NativeWrapper,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

const LIBRARY_BLOB: &[u8] = b"\x7fELF fake shared object";
const BYTE_CODE_BLOB: &[u8] = b"BC\xc0\xde irhelpers";

#[derive(Default)]
struct CountingLoader {
    calls: AtomicUsize,
    failures_left: AtomicUsize,
}

impl CountingLoader {
    fn failing_first(failures: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(failures),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LibraryLoader for CountingLoader {
    fn load_global(&self, path: &Path) -> LoaderResult<LoadedLibrary> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failed {
            return Err(LoaderError::Configuration {
                message: "simulated dlopen failure".to_string(),
            });
        }
        Ok(LoadedLibrary::detached(path))
    }
}

struct RecordingBuilder {
    builds: Arc<AtomicUsize>,
    failures_left: Arc<AtomicUsize>,
    seen_paths: Arc<std::sync::Mutex<Vec<PathBuf>>>,
    path: Option<PathBuf>,
}

impl ConfigurationBuilder for RecordingBuilder {
    fn set_byte_code_file_path(&mut self, path: PathBuf) {
        self.path = Some(path);
    }

    fn build_config_instance(&self) -> LoaderResult<ConfigHandle> {
        let attempt = self.builds.fetch_add(1, Ordering::SeqCst) + 1;
        let path = self.path.clone().expect("builder receives byte code path");
        self.seen_paths.lock().unwrap().push(path);
        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failed {
            return Err(LoaderError::Configuration {
                message: "simulated native builder failure".to_string(),
            });
        }
        Ok(ConfigHandle::new(0x1000 + attempt as i64).unwrap())
    }
}

struct Harness {
    _temp: tempfile::TempDir,
    temp_dir: PathBuf,
    loader: Arc<CountingLoader>,
    builds: Arc<AtomicUsize>,
    seen_paths: Arc<std::sync::Mutex<Vec<PathBuf>>>,
    context: LoaderContext,
}

fn full_assets(settings: &LoaderSettings) -> MemoryAssets {
    MemoryAssets::new()
        .with(settings.library_file_name(), LIBRARY_BLOB.to_vec())
        .with(settings.byte_code_asset.clone(), BYTE_CODE_BLOB.to_vec())
}

fn harness(
    assets: impl FnOnce(&LoaderSettings) -> Arc<dyn jitloader_core::AssetSource>,
    loader: CountingLoader,
    builder_failures: usize,
) -> Harness {
    let temp = tempfile::tempdir().unwrap();
    let temp_dir = temp.path().to_path_buf();
    let settings = LoaderSettings {
        temp_dir: Some(temp_dir.clone()),
        ..LoaderSettings::default()
    };
    let loader = Arc::new(loader);
    let builds = Arc::new(AtomicUsize::new(0));
    let failures_left = Arc::new(AtomicUsize::new(builder_failures));
    let seen_paths = Arc::new(std::sync::Mutex::new(Vec::new()));

    let factory_builds = builds.clone();
    let factory_paths = seen_paths.clone();
    let context = LoaderContext::builder(assets(&settings))
        .settings(settings)
        .library_loader(loader.clone())
        .configuration_builder(Box::new(move |_wrapper: &NativeWrapper| {
            Box::new(RecordingBuilder {
                builds: factory_builds.clone(),
                failures_left: failures_left.clone(),
                seen_paths: factory_paths.clone(),
                path: None,
            }) as Box<dyn ConfigurationBuilder>
        }))
        .build()
        .unwrap();

    Harness {
        _temp: temp,
        temp_dir,
        loader,
        builds,
        seen_paths,
        context,
    }
}

fn extracted_file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

#[test]
fn concurrent_first_callers_share_one_initialization() {
    let h = harness(
        |settings| Arc::new(full_assets(settings)),
        CountingLoader::default(),
        0,
    );
    let callers = 16;
    let barrier = Barrier::new(callers);

    let instances: Vec<usize> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..callers)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    let loader = h.context.instance().expect("instance");
                    loader as *const _ as usize
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    assert_eq!(h.loader.calls(), 1);
    assert!(instances.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(extracted_file_count(&h.temp_dir), 2);
}

#[test]
fn extracted_files_match_bundled_bytes() {
    let h = harness(
        |settings| Arc::new(full_assets(settings)),
        CountingLoader::default(),
        0,
    );

    let loader = h.context.instance().unwrap();

    assert_eq!(std::fs::read(loader.library_path()).unwrap(), LIBRARY_BLOB);
    assert_eq!(
        std::fs::read(loader.byte_code_file_path()).unwrap(),
        BYTE_CODE_BLOB
    );
    let file_name = loader
        .byte_code_file_path()
        .file_name()
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(file_name.starts_with("irhelpers.bc"));
    assert_eq!(loader.wrapper().library_path(), loader.library_path());
}

#[test]
fn default_configuration_is_built_once_and_cached() {
    let h = harness(
        |settings| Arc::new(full_assets(settings)),
        CountingLoader::default(),
        0,
    );
    let callers = 8;
    let barrier = Barrier::new(callers);

    let handles: Vec<ConfigHandle> = std::thread::scope(|scope| {
        let joins: Vec<_> = (0..callers)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    h.context.default_configuration().expect("default configuration")
                })
            })
            .collect();
        joins.into_iter().map(|join| join.join().unwrap()).collect()
    });

    assert_eq!(h.builds.load(Ordering::SeqCst), 1);
    assert!(handles.iter().all(|handle| *handle == handles[0]));
    assert_eq!(h.context.default_configuration().unwrap(), handles[0]);
    assert_eq!(h.context.cached_default_configuration(), Some(handles[0]));

    let byte_code_path = h.context.instance().unwrap().byte_code_file_path().to_path_buf();
    assert_eq!(*h.seen_paths.lock().unwrap(), vec![byte_code_path]);
}

#[test]
fn missing_byte_code_asset_leaves_context_uninitialized() {
    let h = harness(
        |settings| {
            Arc::new(
                MemoryAssets::new().with(settings.library_file_name(), LIBRARY_BLOB.to_vec()),
            )
        },
        CountingLoader::default(),
        0,
    );

    let err = h.context.instance().unwrap_err();

    assert!(matches!(err, LoaderError::Initialization { .. }));
    assert!(matches!(err.root(), LoaderError::AssetNotFound { name } if name == "irhelpers.bc"));
    assert!(h.context.initialized_instance().is_none());

    let config_err = h.context.default_configuration().unwrap_err();
    assert_eq!(config_err.code(), "asset_not_found");
    assert_eq!(h.builds.load(Ordering::SeqCst), 0);
}

#[test]
fn failed_initialization_is_retried_from_scratch() {
    let asset_dir = tempfile::tempdir().unwrap();
    let settings = LoaderSettings::default();
    std::fs::write(
        asset_dir.path().join(settings.library_file_name()),
        LIBRARY_BLOB,
    )
    .unwrap();
    let asset_root = asset_dir.path().to_path_buf();
    let h = harness(
        |_| Arc::new(DirectoryAssets::new(asset_root)),
        CountingLoader::default(),
        0,
    );

    assert!(h.context.instance().is_err());
    assert_eq!(h.loader.calls(), 1);

    std::fs::write(asset_dir.path().join("irhelpers.bc"), BYTE_CODE_BLOB).unwrap();
    let loader = h.context.instance().expect("second attempt succeeds");

    assert_eq!(h.loader.calls(), 2);
    assert_eq!(
        std::fs::read(loader.byte_code_file_path()).unwrap(),
        BYTE_CODE_BLOB
    );
    h.context.instance().unwrap();
    assert_eq!(h.loader.calls(), 2);
}

#[test]
fn library_load_failure_is_not_cached() {
    let h = harness(
        |settings| Arc::new(full_assets(settings)),
        CountingLoader::failing_first(2),
        0,
    );

    for _ in 0..2 {
        let err = h.context.instance().unwrap_err();
        assert!(err.to_string().contains("unable to create native instance"));
        assert_eq!(err.code(), "configuration_failed");
    }
    h.context.instance().expect("third attempt succeeds");
    assert_eq!(h.loader.calls(), 3);
}

#[test]
fn failed_configuration_build_is_retried_without_reloading() {
    let h = harness(
        |settings| Arc::new(full_assets(settings)),
        CountingLoader::default(),
        1,
    );

    let err = h.context.default_configuration().unwrap_err();
    assert!(err.to_string().contains("simulated native builder failure"));
    assert!(h.context.cached_default_configuration().is_none());

    let handle = h.context.default_configuration().expect("retry succeeds");
    assert_eq!(handle.get(), 0x1002);
    assert_eq!(h.builds.load(Ordering::SeqCst), 2);
    assert_eq!(h.loader.calls(), 1);
}

#[test]
fn default_native_builder_reports_missing_symbol_handle() {
    let temp = tempfile::tempdir().unwrap();
    let settings = LoaderSettings {
        temp_dir: Some(temp.path().to_path_buf()),
        ..LoaderSettings::default()
    };
    let context = LoaderContext::builder(Arc::new(full_assets(&settings)))
        .settings(settings)
        .library_loader(Arc::new(CountingLoader::default()))
        .build()
        .unwrap();

    let err = context.default_configuration().unwrap_err();
    assert!(matches!(err, LoaderError::Configuration { .. }));
    assert!(context.initialized_instance().is_some());
    assert!(context.cached_default_configuration().is_none());
}

#[test]
fn invalid_settings_are_rejected_at_build() {
    let settings = LoaderSettings {
        byte_code_asset: "nested/irhelpers.bc".to_string(),
        ..LoaderSettings::default()
    };
    let err = LoaderContext::builder(Arc::new(MemoryAssets::new()))
        .settings(settings)
        .build()
        .unwrap_err();
    assert!(matches!(err, LoaderError::InvalidSettings { .. }));
}
