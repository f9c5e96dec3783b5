use proc_macro::TokenStream;
use quote::{format_ident, quote, ToTokens};
use syn::spanned::Spanned;
use syn::{parse_macro_input, FnArg, GenericParam, ItemFn, LitStr, ReturnType};

/// 计时宏，函数结束后通过 `log::info!` 输出耗时
///
/// 可选参数为日志中使用的名称，如 `#[timing("campaign")]`；缺省时使用函数名。
/// 只能用于自由函数（同步或异步），不支持带 `self` 的方法。
#[proc_macro_attribute]
pub fn timing(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input_fn = parse_macro_input!(item as ItemFn);
    let label = if attr.is_empty() {
        input_fn.sig.ident.to_string()
    } else {
        parse_macro_input!(attr as LitStr).value()
    };

    if let Some(receiver) = input_fn.sig.receiver() {
        return syn::Error::new(receiver.span(), "#[timing] cannot be used on methods")
            .to_compile_error()
            .into();
    }

    let fn_name = &input_fn.sig.ident;
    let wrapped_fn_name = format_ident!("__{}_timed", fn_name);
    let vis = &input_fn.vis;
    let sig = &input_fn.sig;
    let block = &input_fn.block;
    let attrs = &input_fn.attrs;
    let asyncness = &sig.asyncness;

    let generic_params: Vec<&GenericParam> = sig.generics.params.iter().collect();
    let where_clause = &sig.generics.where_clause;

    // 调用包装函数时只需要参数名
    let arg_patterns: Vec<proc_macro2::TokenStream> = sig
        .inputs
        .iter()
        .filter_map(|arg| match arg {
            FnArg::Typed(pat_type) => Some(pat_type.pat.to_token_stream()),
            FnArg::Receiver(_) => None,
        })
        .collect();
    let fn_inputs: Vec<&FnArg> = sig.inputs.iter().collect();

    let return_type = match &sig.output {
        ReturnType::Default => quote! { () },
        ReturnType::Type(_, ty) => ty.to_token_stream(),
    };

    let call = if asyncness.is_some() {
        quote! { #wrapped_fn_name(#(#arg_patterns),*).await }
    } else {
        quote! { #wrapped_fn_name(#(#arg_patterns),*) }
    };

    let output = quote! {
        #(#attrs)*
        #vis #sig {
            let start_time = std::time::Instant::now();
            let result = #call;
            log::info!("`{}` executed in {:?}", #label, start_time.elapsed());
            result
        }

        #[doc(hidden)]
        #asyncness fn #wrapped_fn_name<#(#generic_params),*>(
            #(#fn_inputs),*
        ) -> #return_type #where_clause {
            #block
        }
    };

    TokenStream::from(output)
}
