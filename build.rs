use proc_macro2::TokenStream;
use quote::quote;
use std::env;
use std::fs;
use std::path::Path;

// Note: These types are only used in build.rs for parsing the TOML file
// The actual types used in the crate are generated from this data

#[derive(Debug, serde::Deserialize)]
struct RebalancingConfig {
    frequency: Vec<RebalancingDef>,
}

#[derive(Debug, serde::Deserialize)]
struct RebalancingDef {
    name: String,
    enum_name: String,
    threshold_days: u32,
    display_name: String,
}

fn main() {
    println!("cargo:rerun-if-changed=config/rebalancing.toml");

    // 讀取 rebalancing.toml
    let toml_content = fs::read_to_string("config/rebalancing.toml")
        .expect("Failed to read config/rebalancing.toml");

    let config: RebalancingConfig =
        toml::from_str(&toml_content).expect("Failed to parse config/rebalancing.toml");

    // 生成再平衡頻率宏定義
    let frequencies_macro = generate_rebalancing_macro(&config.frequency);

    // 寫入到輸出目錄
    let out_dir = env::var_os("OUT_DIR").expect("OUT_DIR is set by cargo");
    let dest_path = Path::new(&out_dir).join("rebalancing_generated.rs");

    fs::write(&dest_path, frequencies_macro.to_string())
        .expect("Failed to write generated rebalancing code");
}

fn generate_rebalancing_macro(frequencies: &[RebalancingDef]) -> TokenStream {
    // 為每個頻率生成 token
    let frequency_entries: Vec<TokenStream> = frequencies
        .iter()
        .map(|freq| {
            let enum_name = syn::Ident::new(&freq.enum_name, proc_macro2::Span::call_site());
            let name = &freq.name;
            let threshold_days = freq.threshold_days;
            let display_name = &freq.display_name;

            quote! {
                (#enum_name, #name, #threshold_days, #display_name)
            }
        })
        .collect();

    // 生成完整的宏定義
    quote! {
        /// 再平衡頻率定義宏 - 包含所有頻率的元數據
        /// 這是所有其他宏的數據源
        macro_rules! rebalancing_frequencies {
            ($call:ident) => {
                $call! {
                    #(#frequency_entries),*
                }
            };
        }
    }
}
