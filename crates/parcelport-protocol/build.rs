// Copyright (c) 2026 Parcelport Contributors
// SPDX-License-Identifier: Apache-2.0

fn main() {
    // Use a vendored protoc so contributors/CI don't need a system installation.
    let protoc = protoc_bin_vendored::protoc_bin_path().expect("failed to find protoc");
    std::env::set_var("PROTOC", protoc);

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["proto/parcelport.proto"], &["proto"])
        .expect("failed to compile canonical proto");
}
